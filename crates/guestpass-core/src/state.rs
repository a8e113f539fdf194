// ── Rotation result persistence ──
//
// The presentation surface reads two files from `data_dir`: the JSON
// state document and the join-code PNG it names. Both are replaced by
// writing a temp file in the same directory and renaming it over the
// target, so a reader sees either the previous rotation or this one.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::RotationError;

/// File name of the state document inside the data directory.
pub const STATE_FILE_NAME: &str = "current_guest_pass.json";

const JOIN_IMAGE_MIN_SIZE: u32 = 320;

/// Outcome of a successful rotation, before it is written out.
#[derive(Debug, Clone)]
pub struct RotationResult {
    pub network_name: String,
    pub guest_login: String,
    pub guest_password: SecretString,
    pub rotated_at: DateTime<Utc>,
    /// File name (not path) of the join-code image.
    pub join_image_filename: String,
}

impl RotationResult {
    pub fn new(
        network_name: String,
        guest_login: String,
        guest_password: SecretString,
        rotated_at: DateTime<Utc>,
    ) -> Self {
        let join_image_filename = join_image_filename(&network_name);
        Self {
            network_name,
            guest_login,
            guest_password,
            rotated_at,
            join_image_filename,
        }
    }
}

/// On-disk shape of the state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(rename = "ssid")]
    pub network_name: String,
    pub guest_login: String,
    pub guest_password: String,
    /// ISO-8601 with explicit `+00:00` offset.
    pub last_rotated_utc: String,
    #[serde(rename = "qr_image")]
    pub join_image_filename: String,
}

impl From<&RotationResult> for StateDocument {
    fn from(result: &RotationResult) -> Self {
        Self {
            network_name: result.network_name.clone(),
            guest_login: result.guest_login.clone(),
            guest_password: result.guest_password.expose_secret().to_owned(),
            last_rotated_utc: result
                .rotated_at
                .to_rfc3339_opts(SecondsFormat::Micros, false),
            join_image_filename: result.join_image_filename.clone(),
        }
    }
}

#[derive(Debug, Error)]
enum JoinCodeError {
    #[error("QR encoding failed: {0}")]
    Encode(String),
    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes rotation results for the presentation surface.
#[derive(Debug, Clone)]
pub struct StateWriter {
    data_dir: PathBuf,
}

impl StateWriter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Full path of the state document.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE_NAME)
    }

    /// Persist the document, then the join-code image.
    ///
    /// Only the document decides success. A failed image write is logged
    /// and leaves the previous image (or none) in place.
    pub fn persist(&self, result: &RotationResult) -> Result<(), RotationError> {
        let state_path = self.state_path();
        let persistence = |source| RotationError::Persistence {
            path: state_path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.data_dir).map_err(persistence)?;

        let document = StateDocument::from(result);
        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| persistence(std::io::Error::other(e)))?;
        write_atomic(&state_path, &json).map_err(persistence)?;

        info!(
            ssid = %result.network_name,
            guest_login = %result.guest_login,
            last_rotated_utc = %document.last_rotated_utc,
            "state saved"
        );

        let image_path = self.data_dir.join(&result.join_image_filename);
        match write_join_image(&image_path, &result.network_name) {
            Ok(()) => info!(path = %image_path.display(), "join code written"),
            Err(e) => warn!(
                path = %image_path.display(),
                error = %e,
                "join code image not updated"
            ),
        }

        Ok(())
    }
}

/// Join string for an open network: `WIFI:T:nopass;S:<ssid>;H:false;;`.
pub fn join_string(network_name: &str) -> String {
    format!("WIFI:T:nopass;S:{};H:false;;", escape_join_field(network_name))
}

/// `wifi_qr_<network>.png`, with characters unsafe in file names replaced.
pub fn join_image_filename(network_name: &str) -> String {
    let safe: String = network_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("wifi_qr_{safe}.png")
}

fn escape_join_field(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn write_join_image(path: &Path, network_name: &str) -> Result<(), JoinCodeError> {
    let code =
        QrCode::new(join_string(network_name)).map_err(|e| JoinCodeError::Encode(e.to_string()))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(JOIN_IMAGE_MIN_SIZE, JOIN_IMAGE_MIN_SIZE)
        .build();

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    image.write_to(tmp.as_file_mut(), ImageFormat::Png)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
