//! Disk-space queries

use fontsync_types::DiskSpace;
use std::path::Path;
use tracing::debug;

const MB: f64 = 1024.0 * 1024.0;

/// Report free/total space at `path` and whether `required_mb` fits
///
/// A failed query never fails the caller: it yields the
/// "unknown but assume sufficient" sentinel instead.
pub fn check_disk_space<P: AsRef<Path>>(path: P, required_mb: f64) -> DiskSpace {
    let path = path.as_ref();

    match query_volume(path) {
        Ok((free_bytes, total_bytes)) if total_bytes > 0 => {
            let free_mb = free_bytes as f64 / MB;
            let total_mb = total_bytes as f64 / MB;
            DiskSpace {
                free_mb: (free_mb * 100.0).round() / 100.0,
                total_mb: (total_mb * 100.0).round() / 100.0,
                used_percent: (((total_mb - free_mb) / total_mb) * 1000.0).round() / 10.0,
                sufficient: free_mb >= required_mb,
            }
        }
        Ok(_) => DiskSpace::unknown(),
        Err(e) => {
            debug!("disk-space query failed for {}: {}", path.display(), e);
            DiskSpace::unknown()
        }
    }
}

/// Query (free, total) bytes for the volume holding `path`
#[cfg(unix)]
fn query_volume(path: &Path) -> std::io::Result<(u64, u64)> {
    use std::os::unix::ffi::OsStrExt;

    let c_path = std::ffi::CString::new(path.as_os_str().as_bytes())
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }

    let frsize = stat.f_frsize as u64;
    Ok((
        stat.f_bavail as u64 * frsize,
        stat.f_blocks as u64 * frsize,
    ))
}

#[cfg(not(unix))]
fn query_volume(_path: &Path) -> std::io::Result<(u64, u64)> {
    Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
}
