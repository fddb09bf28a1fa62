//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Site
title: The Structured Thoughts Blog
description: ''
url: http://localhost:4000

# Directory
public_dir: public
static_dir: static

# Content
collections:
  post:
    path: content/post
    format: mdx
  page:
    path: content/page
    format: mdx
home_page: home

# Navigation
menu:
  Posts: /
  About: /about

# Rendering
highlight:
  theme: base16-ocean.dark
  line_number: false
embeds:
  unknown: skip
  # The ad loader is always inserted; serve and placement select the zone
  carbon:
    serve: ''
    placement: ''

# Serving: blocking | off
fallback: blocking
"#;

const HOME: &str = r#"---
title: Home
---

Notes on building things, one structured thought at a time.
"#;

const ABOUT: &str = r#"---
title: About
---

This blog is generated by `thoughts` from Markdown files in `content/`.
"#;

const STYLE: &str = r#"body { font-family: system-ui, sans-serif; margin: 0; line-height: 1.6; }
.band { background: #24292e; color: #fff; padding: 1rem 0; }
.band a { color: #fff; }
.wrapper { max-width: 42rem; margin: 0 auto; padding: 0 1rem; }
.site-title img { vertical-align: middle; margin-right: 0.5rem; }
.posts-list { list-style: none; padding: 0; }
.post-date { color: #6a737d; }
figure.highlight { margin: 1rem 0; overflow-x: auto; }
"#;

fn hello_world(now: &chrono::DateTime<chrono::Local>) -> String {
    format!(
        r#"---
title: Hello World
created_at: {}
---

Welcome! This is your first post. Edit it in `content/post/hello-world.mdx`.

## Code

<CodeBlock language="sh">
thoughts new "My New Post"
thoughts server
</CodeBlock>

## Generate static files

```sh
thoughts generate
```
"#,
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Initialize a new site in the given directory
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    let now = chrono::Local::now();
    let files = [
        ("_config.yml", CONFIG.to_string()),
        ("content/post/hello-world.mdx", hello_world(&now)),
        ("content/page/home.mdx", HOME.to_string()),
        ("content/page/about.mdx", ABOUT.to_string()),
        ("static/style.css", STYLE.to_string()),
    ];

    for (relative, content) in files {
        let path = target_dir.join(relative);
        if path.exists() {
            tracing::warn!("Skipping existing file {:?}", path);
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        tracing::debug!("Created {:?}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentStore;
    use crate::Blog;
    use tempfile::TempDir;

    #[test]
    fn test_init_site_is_loadable() {
        let tmp = TempDir::new().unwrap();
        init_site(tmp.path()).unwrap();

        let blog = Blog::new(tmp.path()).unwrap();
        assert_eq!(blog.config.title, "The Structured Thoughts Blog");

        let store = blog.store();
        let post = store.post("hello-world.mdx").unwrap().data;
        assert_eq!(post.title, "Hello World");
        assert_eq!(post.body.embeds().count(), 1);
        assert!(store.page("home.mdx").is_ok());
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("_config.yml"), "title: Mine\n").unwrap();
        init_site(tmp.path()).unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("_config.yml")).unwrap(),
            "title: Mine\n"
        );
        assert!(tmp.path().join("static/style.css").exists());
    }
}
