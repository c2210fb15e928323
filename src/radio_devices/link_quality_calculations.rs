//! Radio device link quality utilities
//!
//! The transceiver reports the quality of the last received frame as a raw link
//! quality indicator (LQI). Received power in dBm is approximately `-(LQI / 2)`.

/// Converts a raw LQI reading to received power in dBm
///
/// # Example
/// ```rust
/// use packet_radio_link::radio_devices::link_quality_dbm;
///
/// assert_eq!(link_quality_dbm(0), 0);
/// assert_eq!(link_quality_dbm(180), -90);
/// ```
pub fn link_quality_dbm(link_quality: u8) -> i16 {
    -((link_quality / 2) as i16)
}
