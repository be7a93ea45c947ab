use serde::{Deserialize, Serialize};

/// The scripted outcome for one generation request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Text-delta fragments to stream, in order.
    pub deltas: Vec<String>,
    /// If set, the stream fails after yielding this many deltas.
    /// `Some(0)` makes the response fail before the first delta.
    pub fail_after: Option<usize>,
}

impl PresetResponse {
    /// Creates a successful response streaming the given fragments.
    #[inline]
    pub fn with_deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deltas: deltas.into_iter().map(Into::into).collect(),
            fail_after: None,
        }
    }

    /// Makes the stream fail after `count` deltas have been yielded.
    #[inline]
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response =
            PresetResponse::with_deltas(["It depends ", "on the tide."])
                .failing_after(1);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }
}
