//! Build-selected board configuration.
//!
//! Each board adapter publishes a `DEFAULT_CONFIG` describing what is wired
//! on that board. The configuration is fixed once bring-up runs; nothing in
//! it changes at runtime.

/// Where the user button input comes from, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub enum ButtonSource {
    /// Nothing wired. Reads always report "not pressed".
    None,
    /// Dedicated GPIO input.
    Gpio,
    /// Flash chip-select sensing, for boards that repurpose the bootloader
    /// select pin as their only button.
    BootSelect,
}

/// Role assigned to one physical USB port.
///
/// The role gates which clock and peripheral setup paths run during
/// bring-up. This layer serves a device-side stack, so only `Device` ports
/// produce a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub enum PortRole {
    Disabled,
    Device,
    Host,
}

/// Most ports any supported board exposes.
pub const MAX_USB_PORTS: usize = 2;

/// Fixed wiring and capability description for one board.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub struct Config {
    /// Baud rate for the debug console, where one is wired.
    pub console_baud: u32,
    /// Whether bring-up initializes the console at all.
    pub console_enabled: bool,
    /// Button capability of the board.
    pub button: ButtonSource,
    /// Role of each physical USB port.
    pub usb_ports: [PortRole; MAX_USB_PORTS],
}

impl Config {
    /// Baseline configuration: device on port 0, nothing else wired.
    pub const fn new() -> Self {
        Self {
            console_baud: 115_200,
            console_enabled: cfg!(feature = "console"),
            button: ButtonSource::None,
            usb_ports: [PortRole::Device, PortRole::Disabled],
        }
    }

    /// Index of the first port configured with the device role.
    pub const fn device_port(&self) -> Option<usize> {
        let mut i = 0;
        while i < MAX_USB_PORTS {
            if matches!(self.usb_ports[i], PortRole::Device) {
                return Some(i);
            }
            i += 1;
        }
        None
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_assigns_device_to_port_zero() {
        let config = Config::new();
        assert_eq!(config.device_port(), Some(0));
    }

    #[test]
    fn no_device_port_when_all_ports_are_disabled() {
        let mut config = Config::new();
        config.usb_ports = [PortRole::Disabled, PortRole::Disabled];
        assert_eq!(config.device_port(), None);
    }

    #[test]
    fn device_port_skips_non_device_roles() {
        let mut config = Config::new();
        config.usb_ports = [PortRole::Host, PortRole::Device];
        assert_eq!(config.device_port(), Some(1));
    }
}
