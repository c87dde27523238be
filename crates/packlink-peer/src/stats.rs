use serde::Serialize;

/// Counters kept by a sender, receiver or node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Frames that validated and were delivered.
    pub delivered: u64,
    /// Complete frames rejected by checksum or codec.
    pub checksum_failures: u64,
    /// Partial frames abandoned because a sentinel interrupted them.
    pub resyncs: u64,
    /// Length bytes outside `1..=max_encoded_len`.
    pub rejected_lengths: u64,
    /// Operations ended by the abort signal.
    pub resets: u64,
    /// Frames transmitted, retries included.
    pub attempts: u64,
    /// Positive acknowledgements received.
    pub acknowledged: u64,
    /// Acknowledgement bytes other than "checksum OK".
    pub nacks: u64,
    /// Attempts that ended with no acknowledgement byte in time.
    pub ack_timeouts: u64,
    /// Leftover bytes drained before a transmission.
    pub stray_bytes: u64,
    /// Packets given up on after the last attempt.
    pub send_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_every_counter() {
        let stats = LinkStats {
            delivered: 4,
            nacks: 1,
            ..LinkStats::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["delivered"], 4);
        assert_eq!(json["nacks"], 1);
        assert_eq!(json["ack_timeouts"], 0);
        assert_eq!(json.as_object().map(|o| o.len()), Some(11));
    }
}
