//! `author_extrinsicUpdate` notifications.
//!
//! The node reports a watched extrinsic's progress as either a bare string
//! (`"future"`, `"ready"`, `"dropped"`, `"invalid"`) or a single-key object
//! (`{"inBlock": hash}`, `{"finalized": hash}`, `{"usurped": hash}`, ...).

use forge_types::BlockHash;
use serde_json::Value;

use crate::RpcError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtrinsicUpdate {
    /// Queued, broadcast or retracted; nothing to act on.
    Progress(String),
    InBlock(BlockHash),
    Finalized(BlockHash),
    /// The pool gave up on the extrinsic.
    Terminal(String),
}

pub fn parse_update(value: &Value) -> Result<ExtrinsicUpdate, RpcError> {
    match value {
        Value::String(state) => match state.as_str() {
            "future" | "ready" => Ok(ExtrinsicUpdate::Progress(state.clone())),
            "dropped" => Ok(ExtrinsicUpdate::Terminal(
                "transaction dropped from the pool".into(),
            )),
            "invalid" => Ok(ExtrinsicUpdate::Terminal("transaction is invalid".into())),
            other => Err(RpcError::Malformed(format!("unknown extrinsic state {other:?}"))),
        },
        Value::Object(map) => {
            let Some((state, detail)) = map.iter().next() else {
                return Err(RpcError::Malformed("empty extrinsic update".into()));
            };
            match state.as_str() {
                "broadcast" | "retracted" => Ok(ExtrinsicUpdate::Progress(state.clone())),
                "inBlock" => block_hash(detail).map(ExtrinsicUpdate::InBlock),
                "finalized" => block_hash(detail).map(ExtrinsicUpdate::Finalized),
                "usurped" => Ok(ExtrinsicUpdate::Terminal(
                    "transaction usurped by another with the same nonce".into(),
                )),
                "finalityTimeout" => Ok(ExtrinsicUpdate::Terminal(
                    "block containing the transaction was not finalized in time".into(),
                )),
                other => Err(RpcError::Malformed(format!("unknown extrinsic state {other:?}"))),
            }
        }
        other => Err(RpcError::Malformed(format!("extrinsic update {other}"))),
    }
}

pub(crate) fn block_hash(value: &Value) -> Result<BlockHash, RpcError> {
    value
        .as_str()
        .ok_or_else(|| RpcError::Malformed(format!("expected a block hash, got {value}")))
        .and_then(|s| BlockHash::from_hex(s).map_err(|e| RpcError::Malformed(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    #[test]
    fn progress_states() {
        assert_eq!(
            parse_update(&json!("ready")).unwrap(),
            ExtrinsicUpdate::Progress("ready".into())
        );
        assert!(matches!(
            parse_update(&json!({"broadcast": ["12D3KooW"]})).unwrap(),
            ExtrinsicUpdate::Progress(_)
        ));
    }

    #[test]
    fn block_states_carry_the_hash() {
        let hash = BlockHash::new([0x11; 32]);
        assert_eq!(
            parse_update(&json!({"inBlock": HASH})).unwrap(),
            ExtrinsicUpdate::InBlock(hash)
        );
        assert_eq!(
            parse_update(&json!({"finalized": HASH})).unwrap(),
            ExtrinsicUpdate::Finalized(hash)
        );
    }

    #[test]
    fn pool_failures_are_terminal() {
        for update in [
            json!("dropped"),
            json!("invalid"),
            json!({"usurped": HASH}),
            json!({"finalityTimeout": HASH}),
        ] {
            assert!(matches!(
                parse_update(&update).unwrap(),
                ExtrinsicUpdate::Terminal(_)
            ));
        }
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(parse_update(&json!(12)).is_err());
        assert!(parse_update(&json!({"inBlock": "0xzz"})).is_err());
        assert!(parse_update(&json!("teleported")).is_err());
    }
}
