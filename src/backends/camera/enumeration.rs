// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery through PipeWire
//!
//! `pw-cli ls Node` lists every node with a handful of properties. Video
//! sources are picked out by `media.class`, and their placement is looked up
//! per node with `pw-cli info` since `api.libcamera.location` is not part of
//! the listing.

use super::types::{CameraDevice, CameraLocation, CameraSource};
use tracing::{debug, info, warn};

/// Properties of one `pw-cli ls Node` block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct NodeBlock {
    id: String,
    serial: Option<String>,
    description: Option<String>,
    nick: Option<String>,
    media_class: Option<String>,
}

impl NodeBlock {
    fn is_video_source(&self) -> bool {
        self.media_class.as_deref() == Some("Video/Source")
    }

    fn display_name(&self) -> Option<String> {
        self.description.clone().or_else(|| self.nick.clone())
    }
}

/// List the cameras on this machine
///
/// Never returns an empty list when a camera stack exists: if nodes can't be
/// listed, a single "default" entry lets PipeWire (or GStreamer) choose.
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    if gstreamer::init().is_err() {
        warn!("GStreamer init failed, no cameras");
        return Vec::new();
    }

    if gstreamer::ElementFactory::find("pipewiresrc").is_none() {
        info!("pipewiresrc not available, using GStreamer autodetection");
        return vec![CameraDevice {
            name: "Default Camera".to_string(),
            source: CameraSource::Auto,
            location: CameraLocation::Unknown,
        }];
    }

    match list_nodes() {
        Some(cameras) if !cameras.is_empty() => {
            debug!(count = cameras.len(), "Found PipeWire cameras");
            cameras
        }
        _ => {
            info!("Using PipeWire auto-selection (default camera)");
            vec![CameraDevice {
                name: "Default Camera (PipeWire)".to_string(),
                source: CameraSource::PipeWireDefault,
                location: CameraLocation::Unknown,
            }]
        }
    }
}

fn list_nodes() -> Option<Vec<CameraDevice>> {
    let output = std::process::Command::new("pw-cli")
        .args(["ls", "Node"])
        .output()
        .ok()?;

    if !output.status.success() {
        debug!("pw-cli ls failed");
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let cameras = parse_node_listing(&stdout)
        .into_iter()
        .filter(NodeBlock::is_video_source)
        .filter_map(|node| {
            let name = node.display_name()?;
            let location = query_node_location(&node.id);
            debug!(id = %node.id, serial = ?node.serial, %name, %location, "Found video camera");
            Some(CameraDevice {
                name,
                source: CameraSource::PipeWire {
                    node_id: node.id,
                    serial: node.serial,
                },
                location,
            })
        })
        .collect();

    Some(cameras)
}

/// Split `pw-cli ls Node` output into per-node property blocks
fn parse_node_listing(stdout: &str) -> Vec<NodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<NodeBlock> = None;

    for line in stdout.lines() {
        let trimmed = line.trim();

        // "id 76, type PipeWire:Interface:Node/3"
        if let Some(rest) = trimmed.strip_prefix("id ")
            && trimmed.contains("type PipeWire:Interface:Node")
        {
            blocks.extend(current.take());
            let id = rest.split(',').next().unwrap_or_default().trim();
            current = Some(NodeBlock {
                id: id.to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };
        let Some((key, _)) = trimmed.split_once('=') else {
            continue;
        };
        let value = extract_quoted_value(trimmed);
        match key.trim() {
            "object.serial" => block.serial = value,
            "node.description" => block.description = value,
            "node.nick" => block.nick = value,
            "media.class" => block.media_class = value,
            _ => {}
        }
    }

    blocks.extend(current);
    blocks
}

/// Extract the value between the first pair of double quotes
fn extract_quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let end = line[start + 1..].find('"')?;
    Some(line[start + 1..start + 1 + end].to_string())
}

fn query_node_location(node_id: &str) -> CameraLocation {
    match std::process::Command::new("pw-cli")
        .args(["info", node_id])
        .output()
    {
        Ok(output) if output.status.success() => {
            parse_location(&String::from_utf8_lossy(&output.stdout))
        }
        _ => {
            debug!(node_id, "Failed to query node info for location");
            CameraLocation::Unknown
        }
    }
}

/// Find `api.libcamera.location` in `pw-cli info` output
fn parse_location(info: &str) -> CameraLocation {
    info.lines()
        .map(str::trim)
        .find(|line| line.contains("api.libcamera.location"))
        .and_then(extract_quoted_value)
        .map(|value| CameraLocation::from_property(&value))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
	id 31, type PipeWire:Interface:Node/3
 		object.serial = "31"
 		factory.id = "10"
 		node.description = "Dummy-Driver"
 		node.name = "Dummy-Driver"
	id 76, type PipeWire:Interface:Node/3
 		object.serial = "2146"
 		object.path = "libcamera:/base/soc/i2c@0/ov8858@36"
 		node.description = "ov8858"
 		node.nick = "ov8858"
 		media.class = "Video/Source"
	id 77, type PipeWire:Interface:Node/3
 		object.serial = "2147"
 		node.nick = "Integrated Camera"
 		media.class = "Video/Source"
"#;

    #[test]
    fn test_listing_splits_nodes() {
        let blocks = parse_node_listing(LISTING);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].id, "76");
        assert_eq!(blocks[1].serial.as_deref(), Some("2146"));
        assert!(blocks[1].is_video_source());
        assert!(!blocks[0].is_video_source());
    }

    #[test]
    fn test_nick_used_when_description_missing() {
        let blocks = parse_node_listing(LISTING);
        assert_eq!(blocks[2].display_name().as_deref(), Some("Integrated Camera"));
    }

    #[test]
    fn test_location_from_info() {
        let info = r#"
 		api.libcamera.rotation = "270"
 		api.libcamera.location = "back"
"#;
        assert_eq!(parse_location(info), CameraLocation::Back);
        assert_eq!(parse_location(""), CameraLocation::Unknown);
    }
}
