/// The platform mechanism that hands a URL to its registered application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOpener {
    pub program: String,
    /// Arguments placed before the URL.
    pub args: Vec<String>,
}

impl UrlOpener {
    pub fn new(program: impl Into<String>) -> Self {
        UrlOpener {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `open` on macOS, `cmd /C start ""` on Windows, `xdg-open` elsewhere.
    pub fn platform_default() -> Self {
        #[cfg(target_os = "macos")]
        let opener = UrlOpener::new("open");

        #[cfg(target_os = "windows")]
        let opener = UrlOpener {
            program: "cmd".into(),
            args: vec!["/C".into(), "start".into(), "".into()],
        };

        #[cfg(all(not(target_os = "windows"), not(target_os = "macos")))]
        let opener = UrlOpener::new("xdg-open");

        opener
    }

    pub fn argv(&self, url: &str) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.push(url.to_string());
        argv
    }
}

impl Default for UrlOpener {
    fn default() -> Self {
        Self::platform_default()
    }
}
