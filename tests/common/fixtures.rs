//! Test fixtures - temp projects and webapp descriptions.

use std::fs;
use std::path::Path;

use filetime::{set_file_mtime, FileTime};
use tempfile::TempDir;

use crship::domain::entities::Webapp;
use crship::SiteType;

/// A fixed, whole-second modification time for fixture files
pub const FIXED_MTIME: i64 = 1_700_000_000;

/// Minimal Django project that passes every layout check
pub const DJANGO_FILES: &[(&str, &str)] = &[
    ("manage.py", "#!/usr/bin/env python\n"),
    ("requirements.txt", "django>=4.2\n"),
    ("mysite/__init__.py", ""),
    ("mysite/wsgi.py", "application = None\n"),
    ("mysite/settings/prod.py", "DEBUG = False\n"),
];

/// Write `files` into a fresh temp dir, all stamped with `FIXED_MTIME`.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (rel, content) in files {
        write_file(dir.path(), rel, content);
    }
    dir
}

pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, content).expect("write fixture");
    set_file_mtime(&path, FileTime::from_unix_time(FIXED_MTIME, 0)).expect("set mtime");
}

pub fn webapp(site_type: SiteType) -> Webapp {
    Webapp {
        handle: "mysite".into(),
        id: 42,
        name: "My Site".into(),
        site_type,
        django_project: site_type.is_django_based().then(|| "mysite".to_string()),
        primary_url: Some("https://mysite.example/".into()),
        sftp_prod_domain: "mysite.sftp.example".into(),
        sftp_staging_domain: None,
    }
}
