/// Whether `port` can be bound by a service. Port 0 is not a valid choice,
/// and neither is 65535.
pub fn is_valid_port(port: i64) -> bool {
    port > 0 && port < 65535
}
