//! Release archive extraction.

use flate2::read::GzDecoder;
use pulumi_action_core::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::debug;

/// Directory inside every release archive that holds the executables.
pub const ARCHIVE_TOOL_DIR: &str = "pulumi";

/// Unpack a gzip-compressed tarball into `dest`.
pub fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> Result<()> {
    debug!(?archive_path, ?dest, "Extracting archive");

    let file = File::open(archive_path)
        .map_err(|e| Error::io(e, Some(archive_path.to_path_buf()), "opening archive"))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive
        .unpack(dest)
        .map_err(|e| Error::extraction(format!("failed to extract tar: {e}")))
}

/// The tool directory inside an extracted release.
pub fn tool_dir(extracted: &Path) -> Result<PathBuf> {
    let dir = extracted.join(ARCHIVE_TOOL_DIR);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(Error::extraction(format!(
            "archive does not contain a '{ARCHIVE_TOOL_DIR}/' directory"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::Builder;
    use tempfile::TempDir;

    fn tarball_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(encoder);

        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(path).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append(&header, &content[..]).unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_unpack_and_locate() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("pulumi.tar.gz");
        std::fs::write(
            &archive,
            tarball_bytes(&[
                ("pulumi/pulumi", b"#!/bin/sh\n"),
                ("pulumi/pulumi-language-nodejs", b"#!/bin/sh\n"),
            ]),
        )
        .unwrap();

        let dest = temp.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        unpack_tar_gz(&archive, &dest)?;

        let dir = tool_dir(&dest)?;
        assert_eq!(dir, dest.join("pulumi"));
        assert!(dir.join("pulumi-language-nodejs").is_file());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dir.join("pulumi")).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
        Ok(())
    }

    #[test]
    fn test_missing_tool_dir() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("other.tar.gz");
        std::fs::write(&archive, tarball_bytes(&[("bin/other", b"x")])).unwrap();

        unpack_tar_gz(&archive, temp.path()).unwrap();
        assert!(matches!(tool_dir(temp.path()), Err(Error::Extraction { .. })));
    }

    #[test]
    fn test_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bad.tar.gz");
        std::fs::write(&archive, b"definitely not gzip").unwrap();

        let result = unpack_tar_gz(&archive, temp.path());
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }
}
