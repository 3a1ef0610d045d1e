use std::path::Path;

use alloy::primitives::Bytes;
use serde_json::Value;

use crate::ClientError;

alloy::sol! {
    #[sol(rpc)]
    contract IMintableToken {
        function mint(address to, uint256 amount) external;
        function burn(uint256 amount) external;
        function balanceOf(address) public view returns (uint256);
        function decimals() public view returns (uint8);
    }

    #[sol(rpc)]
    contract IMintableNft {
        function mint(address to) external;
        function balanceOf(address owner) public view returns (uint256);
    }
}

/// Read creation bytecode from a compiled artifact. Accepts `bytecode` as a hex
/// string (hardhat) or as `{ "object": .. }` (foundry).
pub fn load_bytecode(path: &Path) -> Result<Bytes, ClientError> {
    let artifact_error = |reason: String| ClientError::Artifact {
        path: path.to_path_buf(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
    let json: Value = serde_json::from_str(&raw).map_err(|e| artifact_error(e.to_string()))?;
    let hex = json
        .get("bytecode")
        .and_then(|b| b.as_str().or_else(|| b.get("object").and_then(Value::as_str)))
        .ok_or_else(|| artifact_error("missing bytecode".into()))?;

    let bytecode: Bytes = hex
        .parse()
        .map_err(|e| artifact_error(format!("invalid bytecode: {e}")))?;
    if bytecode.is_empty() {
        return Err(artifact_error("empty bytecode".into()));
    }
    Ok(bytecode)
}
