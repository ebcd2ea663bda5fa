use anyhow::{anyhow, Result};
use semver::{Version, VersionReq};
use std::path::{Path, PathBuf};
use tracing::error;
use which::which;

/// Resolves the executable for an external collaborator (an aligner, an
/// index builder, an annotation tagger) on `$PATH`. The planner never calls
/// this itself -- it only describes commands -- but the executor-facing
/// command descriptions carry a program name that is resolved this way.
pub fn get_which_executable(prog_name: &str) -> Result<PathBuf> {
    match which(prog_name) {
        Ok(p) => Ok(p),
        Err(e) => Err(anyhow!(
            "could not find `{}` in your path: {}",
            prog_name,
            e
        )),
    }
}

/// Checks a version string against a semver requirement, used to record the
/// minimum mapper version a synthesised command assumes.
pub fn check_version_constraints<S1: AsRef<str>>(
    prog_name: &str,
    req_string: S1,
    prog_ver_string: &str,
) -> Result<Version> {
    let parsed_version = Version::parse(prog_ver_string)
        .map_err(|e| anyhow!("could not parse version {}: {}", prog_ver_string, e))?;
    let req = VersionReq::parse(req_string.as_ref())
        .map_err(|e| anyhow!("could not parse version requirement {}", e))?;
    if req.matches(&parsed_version) {
        Ok(parsed_version)
    } else {
        Err(anyhow!(
            "parsed version of {} ({:?}) does not satisfy constraints {}. Please install a compatible version.",
            prog_name,
            prog_ver_string,
            req
        ))
    }
}

/// Verifies that every path in `file_vec` exists, logging each miss before
/// returning a single aggregate error. Used when a caller wants to sanity
/// check the on-disk inputs a synthesised command describes.
pub fn check_files_exist(file_vec: &[PathBuf]) -> Result<()> {
    let mut all_valid = true;
    for fb in file_vec {
        match fb.as_path().try_exists() {
            Ok(true) => {}
            Ok(false) => {
                error!("required input file at path {} was not found", fb.display());
                all_valid = false;
            }
            Err(e) => {
                error!("{:#?}", e);
                all_valid = false;
            }
        }
    }

    if !all_valid {
        return Err(anyhow!("required input files were missing; cannot proceed!"));
    }
    Ok(())
}

/// Detects the compression format implied by a reference file's name, using
/// the same vocabulary the rest of the ecosystem uses (`niffler`). This is a
/// pure string inspection: the planner never opens the file to sniff it.
pub fn detect_compression(path: &Path) -> niffler::compression::Format {
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => niffler::compression::Format::Gzip,
        Some("bz2") => niffler::compression::Format::Bzip,
        Some("xz") | Some("lzma") => niffler::compression::Format::Lzma,
        _ => niffler::compression::Format::No,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_gzip_by_suffix() {
        assert_eq!(
            detect_compression(Path::new("genome.fa.gz")),
            niffler::compression::Format::Gzip
        );
        assert_eq!(
            detect_compression(Path::new("genome.fa")),
            niffler::compression::Format::No
        );
    }

    #[test]
    fn version_constraint_rejects_incompatible() {
        assert!(check_version_constraints("STAR", ">=2.7.0, <3.0.0", "2.6.1").is_err());
        assert!(check_version_constraints("STAR", ">=2.7.0, <3.0.0", "2.7.10").is_ok());
    }
}
