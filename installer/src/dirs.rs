//! Directory resolution abstraction for platform-specific paths.
//!
//! The install prefix is chosen in this order: an explicit `--prefix`, the
//! `FORMULA_PREFIX` environment variable, then `~/.local`. Executables land
//! in `<prefix>/bin`, which on most Linux desktops is already on `PATH`.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

/// Environment variable overriding the default prefix.
pub const PREFIX_ENV: &str = "FORMULA_PREFIX";

/// Source of per-user base directories.
pub trait BaseDirs {
    /// The current user's home directory, if it can be determined and is
    /// valid UTF-8.
    fn home_dir(&self) -> Option<Utf8PathBuf>;
}

/// Base directories of the running system, via `directories-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<Utf8PathBuf> {
        directories_next::BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::try_from(dirs.home_dir().to_path_buf()).ok())
    }
}

/// The prefix used when neither a flag nor the environment names one.
#[must_use]
pub fn default_prefix(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    dirs.home_dir().map(|home| home.join(".local"))
}

/// Resolve the install prefix, consulting [`PREFIX_ENV`].
///
/// # Errors
///
/// Returns [`InstallerError::PrefixUnresolved`] when no prefix is given and
/// no home directory can be found.
pub fn resolve_prefix(cli_prefix: Option<&Utf8Path>, dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    let env_prefix = std::env::var(PREFIX_ENV).ok();
    resolve_prefix_with(cli_prefix, env_prefix.as_deref(), dirs)
}

/// Resolve the install prefix from explicit inputs.
///
/// Empty values are treated as unset.
///
/// # Errors
///
/// Returns [`InstallerError::PrefixUnresolved`] when every source is empty.
///
/// # Examples
///
/// ```
/// use camino::{Utf8Path, Utf8PathBuf};
/// use formula_installer::dirs::{BaseDirs, resolve_prefix_with};
///
/// struct NoHome;
/// impl BaseDirs for NoHome {
///     fn home_dir(&self) -> Option<Utf8PathBuf> {
///         None
///     }
/// }
///
/// let prefix = resolve_prefix_with(None, Some("/opt/tools"), &NoHome)?;
/// assert_eq!(prefix, Utf8Path::new("/opt/tools"));
/// # Ok::<(), formula_installer::error::InstallerError>(())
/// ```
pub fn resolve_prefix_with(
    cli_prefix: Option<&Utf8Path>,
    env_prefix: Option<&str>,
    dirs: &dyn BaseDirs,
) -> Result<Utf8PathBuf> {
    if let Some(prefix) = cli_prefix.filter(|p| !p.as_str().is_empty()) {
        debug!("using prefix from command line: {prefix}");
        return Ok(prefix.to_owned());
    }
    if let Some(prefix) = env_prefix.filter(|p| !p.is_empty()) {
        debug!("using prefix from {PREFIX_ENV}: {prefix}");
        return Ok(Utf8PathBuf::from(prefix));
    }
    default_prefix(dirs).ok_or_else(|| InstallerError::PrefixUnresolved {
        reason: format!("no --prefix given, {PREFIX_ENV} unset, and no home directory found"),
    })
}
