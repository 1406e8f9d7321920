//! Outbound line sanitization.

/// Characters that may never appear inside an outbound line.
const FORBIDDEN: [char; 3] = ['\r', '\n', '\0'];

/// Removes carriage return, line feed and NUL characters from `message`.
///
/// Every other character is kept in its original order. RFC 1459 frames
/// messages by CR-LF, so an embedded line break would let one message inject
/// a second raw protocol line.
pub fn sanitize(message: &str) -> String {
    message.chars().filter(|c| !FORBIDDEN.contains(c)).collect()
}
