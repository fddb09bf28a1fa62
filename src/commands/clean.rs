//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Blog;

/// Delete the generated output
pub fn run(blog: &Blog) -> Result<()> {
    if blog.public_dir.exists() {
        fs::remove_dir_all(&blog.public_dir)?;
        tracing::info!("Deleted: {:?}", blog.public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_public_only() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::with_config(tmp.path().to_path_buf(), SiteConfig::default());
        fs::create_dir_all(blog.public_dir.join("about")).unwrap();
        fs::create_dir_all(tmp.path().join("content/post")).unwrap();

        run(&blog).unwrap();
        assert!(!blog.public_dir.exists());
        assert!(tmp.path().join("content/post").exists());
        // Cleaning twice is fine
        run(&blog).unwrap();
    }
}
