// SPDX-License-Identifier: GPL-3.0-only

//! Runtime permission gate
//!
//! Two permissions are needed before a camera stream may be bound:
//!
//! - **Camera**: inside a sandbox this is granted by the XDG desktop portal
//!   (`org.freedesktop.portal.Camera`); natively, by read/write access to the
//!   `/dev/video*` nodes.
//! - **Storage write**: the picture album can be created and written.
//!
//! [`PermissionGate::ensure`] resolves exactly once. A denial ends the
//! session; there is no retry loop.

use crate::errors::PermissionError;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::collections::HashMap;
use std::ffi::CString;
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_BUS_NAME: &str = "org.freedesktop.portal.Desktop";
const PORTAL_OBJECT_PATH: &str = "/org/freedesktop/portal/desktop";
const PORTAL_CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const PORTAL_REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// A runtime permission the app depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    StorageWrite,
}

/// Permissions checked before the camera starts
pub const REQUIRED_PERMISSIONS: [Permission; 2] = [Permission::Camera, Permission::StorageWrite];

/// Final answer of the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied(PermissionError),
}

/// Interactive camera access request
///
/// Resolves to `true` when the user allowed access.
pub trait CameraAccessRequest: fmt::Debug + Send + Sync {
    fn request(&self) -> BoxFuture<'_, Result<bool, PermissionError>>;
}

/// Asks `org.freedesktop.portal.Camera` over the session bus
#[derive(Debug, Clone, Copy, Default)]
pub struct PortalCameraRequest;

impl CameraAccessRequest for PortalCameraRequest {
    fn request(&self) -> BoxFuture<'_, Result<bool, PermissionError>> {
        request_portal_camera_access().boxed()
    }
}

/// Checks and requests the runtime permissions
#[derive(Debug, Clone)]
pub struct PermissionGate {
    album_dir: PathBuf,
    device_dir: PathBuf,
    sandboxed: bool,
    camera_request: Arc<dyn CameraAccessRequest>,
}

impl PermissionGate {
    /// Gate for the given album directory on this machine
    pub fn new(album_dir: impl Into<PathBuf>) -> Self {
        Self {
            album_dir: album_dir.into(),
            device_dir: PathBuf::from("/dev"),
            sandboxed: crate::constants::app_info::is_flatpak(),
            camera_request: Arc::new(PortalCameraRequest),
        }
    }

    /// Look for video device nodes somewhere other than `/dev`
    pub fn with_device_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.device_dir = dir.into();
        self
    }

    /// Override sandbox detection
    pub fn with_sandboxed(mut self, sandboxed: bool) -> Self {
        self.sandboxed = sandboxed;
        self
    }

    /// Ask for sandboxed camera access through something other than the portal
    pub fn with_camera_request(mut self, request: impl CameraAccessRequest + 'static) -> Self {
        self.camera_request = Arc::new(request);
        self
    }

    /// Permissions that are not currently held, without asking the user
    pub fn missing(&self) -> Vec<Permission> {
        REQUIRED_PERMISSIONS
            .into_iter()
            .filter(|permission| !self.is_held(*permission))
            .collect()
    }

    fn is_held(&self, permission: Permission) -> bool {
        match permission {
            // Sandboxed camera access is only known after asking the portal
            Permission::Camera => !self.sandboxed && video_nodes_accessible(&self.device_dir),
            Permission::StorageWrite => self.storage_writable().is_ok(),
        }
    }

    fn storage_writable(&self) -> Result<(), String> {
        std::fs::create_dir_all(&self.album_dir).map_err(|e| e.to_string())?;
        if is_accessible(&self.album_dir, libc::W_OK | libc::X_OK) {
            Ok(())
        } else {
            Err(format!("{} is read-only", self.album_dir.display()))
        }
    }

    /// Resolve all required permissions
    ///
    /// Returns immediately when everything is already granted; otherwise
    /// issues at most one interactive request.
    pub async fn ensure(&self) -> PermissionOutcome {
        let missing = self.missing();
        if missing.is_empty() {
            debug!("All permissions already granted");
            return PermissionOutcome::Granted;
        }
        info!(?missing, "Permissions missing");

        if missing.contains(&Permission::StorageWrite) {
            let reason = self
                .storage_writable()
                .err()
                .unwrap_or_else(|| "unknown".to_string());
            return PermissionOutcome::Denied(PermissionError::StorageDenied(reason));
        }

        if !self.sandboxed {
            // Device node permissions cannot be granted interactively
            warn!(dir = %self.device_dir.display(), "Video devices are not accessible");
            return PermissionOutcome::Denied(PermissionError::CameraDenied);
        }

        match self.camera_request.request().await {
            Ok(true) => PermissionOutcome::Granted,
            Ok(false) => PermissionOutcome::Denied(PermissionError::CameraDenied),
            Err(e) => PermissionOutcome::Denied(e),
        }
    }
}

/// `access(2)` on a path
fn is_accessible(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

/// True when no video nodes exist or at least one can be opened read/write
///
/// Without any node the camera simply fails to bind later, which is reported
/// as a binding error rather than a permission problem.
fn video_nodes_accessible(device_dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(device_dir) else {
        return true;
    };

    let nodes: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("video"))
        .map(|e| e.path())
        .collect();

    nodes.is_empty()
        || nodes
            .iter()
            .any(|node| is_accessible(node, libc::R_OK | libc::W_OK))
}

/// Portal request object path for our connection and `token`
fn request_path(unique_name: &str, token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{PORTAL_OBJECT_PATH}/request/{sender}/{token}")
}

/// Ask the desktop portal for camera access
///
/// Subscribes to the predicted request object's `Response` signal before
/// calling `AccessCamera`, so a fast answer cannot be missed.
async fn request_portal_camera_access() -> Result<bool, PermissionError> {
    let failed = |e: zbus::Error| PermissionError::RequestFailed(e.to_string());

    let connection = zbus::Connection::session().await.map_err(failed)?;

    let camera = zbus::Proxy::new(
        &connection,
        PORTAL_BUS_NAME,
        PORTAL_OBJECT_PATH,
        PORTAL_CAMERA_INTERFACE,
    )
    .await
    .map_err(failed)?;

    let present: bool = camera
        .get_property("IsCameraPresent")
        .await
        .map_err(|e| PermissionError::RequestFailed(e.to_string()))?;
    if !present {
        // Nothing to grant; binding will report the missing camera
        info!("Portal reports no camera present");
        return Ok(true);
    }

    let unique_name = connection
        .unique_name()
        .map(|name| name.as_str().to_string())
        .ok_or_else(|| PermissionError::RequestFailed("no unique bus name".to_string()))?;
    let token = format!("snapcam_{}", uuid::Uuid::new_v4().simple());
    let path = request_path(&unique_name, &token);

    let request = zbus::Proxy::new(
        &connection,
        PORTAL_BUS_NAME,
        path.as_str(),
        PORTAL_REQUEST_INTERFACE,
    )
    .await
    .map_err(failed)?;
    let mut responses = request.receive_signal("Response").await.map_err(failed)?;

    let mut options: HashMap<&str, Value<'_>> = HashMap::new();
    options.insert("handle_token", Value::from(token.as_str()));

    info!("Requesting camera access from desktop portal");
    let handle: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .await
        .map_err(failed)?;
    debug!(handle = %handle.as_str(), "Portal request issued");

    let message = responses.next().await.ok_or_else(|| {
        PermissionError::RequestFailed("portal closed without answering".to_string())
    })?;
    let (code, _results): (u32, HashMap<String, OwnedValue>) = message
        .body()
        .deserialize()
        .map_err(|e| PermissionError::RequestFailed(e.to_string()))?;

    info!(code, "Portal camera response");
    Ok(code == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snapcam-{tag}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Answers every request the same way and counts them
    #[derive(Debug)]
    struct CannedAnswer {
        answer: Result<bool, PermissionError>,
        asked: Arc<AtomicUsize>,
    }

    impl CannedAnswer {
        fn new(answer: Result<bool, PermissionError>) -> (Self, Arc<AtomicUsize>) {
            let asked = Arc::new(AtomicUsize::new(0));
            let request = Self {
                answer,
                asked: Arc::clone(&asked),
            };
            (request, asked)
        }
    }

    impl CameraAccessRequest for CannedAnswer {
        fn request(&self) -> BoxFuture<'_, Result<bool, PermissionError>> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(self.answer.clone()).boxed()
        }
    }

    fn sandboxed_gate(request: CannedAnswer) -> PermissionGate {
        PermissionGate::new(temp_dir("album"))
            .with_device_dir(temp_dir("dev"))
            .with_sandboxed(true)
            .with_camera_request(request)
    }

    #[test]
    fn test_request_path_follows_portal_convention() {
        assert_eq!(
            request_path(":1.42", "snapcam_abc"),
            "/org/freedesktop/portal/desktop/request/1_42/snapcam_abc"
        );
    }

    #[test]
    fn test_native_without_video_nodes_is_granted() {
        let album = temp_dir("album").join("CameraX-Image");
        let gate = PermissionGate::new(&album)
            .with_device_dir(temp_dir("dev"))
            .with_sandboxed(false);

        assert!(gate.missing().is_empty());
        assert!(album.is_dir(), "storage check creates the album");
    }

    #[test]
    fn test_sandboxed_camera_always_needs_portal() {
        let gate = PermissionGate::new(temp_dir("album"))
            .with_device_dir(temp_dir("dev"))
            .with_sandboxed(true);
        assert_eq!(gate.missing(), vec![Permission::Camera]);
    }

    #[tokio::test]
    async fn test_uncreatable_album_is_denied() {
        let blocker = temp_dir("blocker").join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // A path below a regular file can never be created
        let gate = PermissionGate::new(blocker.join("album"))
            .with_device_dir(temp_dir("dev"))
            .with_sandboxed(false);

        match gate.ensure().await {
            PermissionOutcome::Denied(PermissionError::StorageDenied(_)) => {}
            other => panic!("expected storage denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sandboxed_refusal_denies_camera() {
        let (request, asked) = CannedAnswer::new(Ok(false));
        let outcome = sandboxed_gate(request).ensure().await;

        assert_eq!(outcome, PermissionOutcome::Denied(PermissionError::CameraDenied));
        assert_eq!(asked.load(Ordering::SeqCst), 1, "asked exactly once");
    }

    #[tokio::test]
    async fn test_sandboxed_approval_grants() {
        let (request, asked) = CannedAnswer::new(Ok(true));
        let outcome = sandboxed_gate(request).ensure().await;

        assert_eq!(outcome, PermissionOutcome::Granted);
        assert_eq!(asked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_request_is_a_denial() {
        let failure = PermissionError::RequestFailed("no session bus".to_string());
        let (request, _) = CannedAnswer::new(Err(failure.clone()));

        assert_eq!(
            sandboxed_gate(request).ensure().await,
            PermissionOutcome::Denied(failure)
        );
    }

    #[tokio::test]
    async fn test_storage_denial_skips_camera_request() {
        let blocker = temp_dir("blocker").join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let (request, asked) = CannedAnswer::new(Ok(true));
        let gate = PermissionGate::new(blocker.join("album"))
            .with_device_dir(temp_dir("dev"))
            .with_sandboxed(true)
            .with_camera_request(request);

        assert!(matches!(
            gate.ensure().await,
            PermissionOutcome::Denied(PermissionError::StorageDenied(_))
        ));
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }
}
