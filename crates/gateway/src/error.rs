/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The endpoint returned a non-success status, or the transport
    /// failed before or during the stream.
    Transport,
    /// The stream payload could not be decoded.
    InvalidPayload,
    /// Any other errors.
    Other,
}
