//! Premake install: the fetch-then-extract composition the engine setup runs.

use fetchkit::{
    ExtractOptions, ExtractOutcome, FetchSource, Fetcher, ProgressSink, Transport,
};
use std::error::Error;
use std::path::{Path, PathBuf};

/// Premake release the engine's project files are generated with.
pub const DEFAULT_PREMAKE_VERSION: &str = "5.0.0-beta2";

/// License shipped next to the executable.
pub const PREMAKE_LICENSE_URL: &str =
    "https://raw.githubusercontent.com/premake/premake-core/master/LICENSE.txt";

const RELEASES_URL: &str = "https://github.com/premake/premake-core/releases/download";

/// Everything the install needs, fixed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremakeConfig {
    /// Release version without the leading `v`
    pub version: String,
    /// Platform name used in release asset names
    pub system: String,
    /// Directory holding the executable
    pub directory: PathBuf,
}

impl PremakeConfig {
    /// Configuration for the running platform.
    ///
    /// Without an explicit directory, premake goes to
    /// `Thirdparty/premake/bin/<system>`.
    pub fn for_host(version: &str, directory: Option<PathBuf>) -> Self {
        let system = match std::env::consts::OS {
            "macos" => "macosx",
            other => other,
        }
        .to_string();
        let directory = directory.unwrap_or_else(|| {
            Path::new("Thirdparty")
                .join("premake")
                .join("bin")
                .join(&system)
        });

        Self {
            version: version.to_string(),
            system,
            directory,
        }
    }

    fn is_windows(&self) -> bool {
        self.system == "windows"
    }

    /// Release archives are zip on Windows and gzip tarballs elsewhere.
    pub fn archive_extension(&self) -> &'static str {
        if self.is_windows() {
            "zip"
        } else {
            "tar.gz"
        }
    }

    pub fn archive_name(&self) -> String {
        format!(
            "premake-{}-{}.{}",
            self.version,
            self.system,
            self.archive_extension()
        )
    }

    pub fn archive_url(&self) -> String {
        format!("{}/v{}/{}", RELEASES_URL, self.version, self.archive_name())
    }

    pub fn archive_path(&self) -> PathBuf {
        self.directory.join(self.archive_name())
    }

    pub fn executable_path(&self) -> PathBuf {
        let name = if self.is_windows() {
            "premake5.exe"
        } else {
            "premake5"
        };
        self.directory.join(name)
    }

    pub fn license_path(&self) -> PathBuf {
        self.directory.join("LICENSE.txt")
    }
}

/// What [`ensure_premake`] found or did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PremakeStatus {
    /// The executable was already there.
    Present(PathBuf),
    /// The executable was downloaded.
    Installed(PathBuf),
    /// The executable is missing and the install was not authorized.
    Missing,
}

/// Makes sure the premake executable exists, downloading it when `authorized`.
///
/// The install fetches the release archive, extracts it in place (removing
/// the archive), marks the executable runnable on unix and fetches the
/// license beside it.
pub fn ensure_premake<T: Transport>(
    config: &PremakeConfig,
    authorized: bool,
    fetcher: &Fetcher<T>,
    progress: &mut dyn ProgressSink,
) -> Result<PremakeStatus, Box<dyn Error>> {
    let executable = config.executable_path();
    if executable.is_file() {
        tracing::info!("Correct Premake located at {}", executable.display());
        return Ok(PremakeStatus::Present(executable));
    }

    if !authorized {
        tracing::warn!("Premake is not installed.");
        return Ok(PremakeStatus::Missing);
    }

    let archive = fetcher.fetch(
        &FetchSource::Single(config.archive_url()),
        &config.archive_path(),
        progress,
    )?;

    if let ExtractOutcome::Unsupported { extension } =
        fetchkit::extract(&archive, &ExtractOptions::default(), progress)?
    {
        return Err(format!("Premake archive has an unsupported type: {extension}").into());
    }

    if !executable.is_file() {
        return Err(format!(
            "Premake archive did not contain {}",
            executable.display()
        )
        .into());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755))?;
    }

    fetcher.fetch(
        &FetchSource::from(PREMAKE_LICENSE_URL),
        &config.license_path(),
        progress,
    )?;

    tracing::info!(
        "Premake {} has been downloaded to '{}'",
        config.version,
        config.directory.display()
    );
    Ok(PremakeStatus::Installed(executable))
}
