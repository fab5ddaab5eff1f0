// Purpose - external interfaces, device resources

pub mod output;

pub use output::{DeviceError, OutputDevice, UserGesture};
