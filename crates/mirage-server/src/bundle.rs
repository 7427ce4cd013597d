//! Per-node agent bundle generation.
//!
//! The archive is assembled in memory on every request and never
//! persisted: `config.json` with the node's identity and a freshly
//! minted credential, a self-contained reporting agent, an install
//! script, and a README.

use std::io::{Cursor, Write};

use mirage_auth::IssuedNodeKey;
use mirage_core::error::{MirageError, MirageResult};
use mirage_core::models::node::Node;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const AGENT_PY: &str = include_str!("bundle/agent.py");
const INSTALL_SH: &str = include_str!("bundle/install.sh");
const README_MD: &str = include_str!("bundle/README.md");

/// Build the `agent-{node_id}.zip` payload.
pub fn build_agent_bundle(
    node: &Node,
    api_key: &IssuedNodeKey,
    backend_url: &str,
    classifier_url: &str,
) -> MirageResult<Vec<u8>> {
    let config = serde_json::json!({
        "node_id": node.node_id,
        "node_api_key": api_key.expose(),
        "node_name": node.name,
        "backend_url": backend_url,
        "classifier_url": classifier_url,
        "version": env!("CARGO_PKG_VERSION"),
    });
    let config_json = serde_json::to_string_pretty(&config)
        .map_err(|e| MirageError::Internal(format!("bundle config encode: {e}")))?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let entries: [(&str, &str); 4] = [
        ("config.json", &config_json),
        ("agent.py", AGENT_PY),
        ("install.sh", INSTALL_SH),
        ("README.md", README_MD),
    ];

    for (name, content) in entries {
        zip.start_file(name, options)
            .map_err(|e| MirageError::Internal(format!("bundle entry {name}: {e}")))?;
        zip.write_all(content.as_bytes())
            .map_err(|e| MirageError::Internal(format!("bundle entry {name}: {e}")))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| MirageError::Internal(format!("bundle finish: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mirage_auth::mint_node_key;
    use mirage_core::models::node::NodeStatus;

    fn node() -> Node {
        Node {
            node_id: "nd_bundle".into(),
            user_id: uuid::Uuid::new_v4(),
            name: "probe".into(),
            status: NodeStatus::Unknown,
            api_key_hash: "h".into(),
            hostname: None,
            os: None,
            last_seen: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn bundle_is_a_zip_with_the_expected_entries() {
        let (key, _) = mint_node_key();
        let bytes =
            build_agent_bundle(&node(), &key, "http://backend:8001", "http://ml:8000").unwrap();

        // Local-file magic.
        assert_eq!(&bytes[..4], b"PK\x03\x04");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["config.json", "agent.py", "install.sh", "README.md"]
        );

        let mut config = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("config.json").unwrap(), &mut config)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&config).unwrap();
        assert_eq!(parsed["node_id"], "nd_bundle");
        assert_eq!(parsed["node_api_key"], key.expose());
        assert_eq!(parsed["backend_url"], "http://backend:8001");
    }
}
