//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::{fs::read_to_string, path::{Path, PathBuf}};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable giving the root of the software tree, under which the `params`
/// directory is found.
pub const SW_ROOT_ENV_VAR: &str = "DIFF_GUIDANCE_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot load the parmeter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// Absolute paths are used as given. Relative paths are resolved against the `params` directory
/// under `$DIFF_GUIDANCE_SW_ROOT` if that variable is set, otherwise against the working
/// directory.
pub fn load<P>(param_file_path: impl AsRef<Path>) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    let path = resolve(param_file_path.as_ref());

    let params_str = match read_to_string(&path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(path, e))
    };

    from_str(params_str.as_str())
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

/// Resolve a parameter file path following the rules given in [`load`].
pub fn resolve(param_file_path: &Path) -> PathBuf {
    if param_file_path.is_absolute() {
        return param_file_path.to_path_buf()
    }

    match std::env::var_os(SW_ROOT_ENV_VAR) {
        Some(root) => {
            let mut path = PathBuf::from(root);
            path.push("params");
            path.push(param_file_path);
            path
        },
        None => param_file_path.to_path_buf()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TestParams {
        gain: f32,
        name: String
    }

    #[test]
    fn test_from_str() {
        let p: TestParams = from_str("gain = 1.5\nname = \"heading\"").unwrap();
        assert_eq!(p.gain, 1.5);
        assert_eq!(p.name, "heading");

        let e = from_str::<TestParams>("gain = \"fast\"");
        assert!(matches!(e, Err(LoadError::DeserialiseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let e = load::<TestParams>("/definitely/not/a/real/params.toml");
        assert!(matches!(e, Err(LoadError::FileLoadError(_, _))));
    }
}
