//! Driving directions in external map apps.
//!
//! Waze gets an app-scheme attempt on phones with a timed fallback to its web
//! page. Google Maps and Apple Maps always open their web URL.

use async_trait::async_trait;
use regex::Regex;
use std::io;
use std::sync::OnceLock;
use std::time::Duration;

/// How long an app-scheme launch gets before the web URL takes over.
pub const DEFAULT_APP_FALLBACK: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
    Desktop,
}

impl Platform {
    pub fn from_user_agent(user_agent: &str) -> Self {
        static IOS: OnceLock<Regex> = OnceLock::new();
        static ANDROID: OnceLock<Regex> = OnceLock::new();

        let ios = IOS.get_or_init(|| Regex::new(r"iPad|iPhone|iPod").expect("static pattern"));
        let android = ANDROID.get_or_init(|| Regex::new(r"Android").expect("static pattern"));

        if ios.is_match(user_agent) {
            Platform::Ios
        } else if android.is_match(user_agent) {
            Platform::Android
        } else {
            Platform::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        matches!(self, Platform::Ios | Platform::Android)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationService {
    Waze,
    GoogleMaps,
    AppleMaps,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchPlan {
    /// Navigate to `app_url`; go to `web_url` unless the host loses focus
    /// within `fallback_after`.
    AppWithFallback {
        app_url: String,
        web_url: String,
        fallback_after: Duration,
    },
    NewContext { url: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    OpenedApp,
    FellBackToWeb,
    OpenedWeb,
}

pub struct NavigationLinkBuilder {
    fallback_after: Duration,
}

impl NavigationLinkBuilder {
    pub fn new(fallback_after: Duration) -> Self {
        Self { fallback_after }
    }

    pub fn plan(&self, service: NavigationService, lat: f64, lng: f64, platform: Platform) -> LaunchPlan {
        match service {
            NavigationService::Waze => self.waze(lat, lng, platform),
            NavigationService::GoogleMaps => LaunchPlan::NewContext {
                url: google_maps_url(lat, lng),
            },
            NavigationService::AppleMaps => LaunchPlan::NewContext {
                url: apple_maps_url(lat, lng),
            },
        }
    }

    pub fn waze(&self, lat: f64, lng: f64, platform: Platform) -> LaunchPlan {
        let web_url = waze_web_url(lat, lng);
        if platform.is_mobile() {
            LaunchPlan::AppWithFallback {
                app_url: format!("waze://?ll={},{}&navigate=yes", lat, lng),
                web_url,
                fallback_after: self.fallback_after,
            }
        } else {
            LaunchPlan::NewContext { url: web_url }
        }
    }
}

impl Default for NavigationLinkBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_APP_FALLBACK)
    }
}

pub fn waze_web_url(lat: f64, lng: f64) -> String {
    format!("https://waze.com/ul?ll={},{}&navigate=yes", lat, lng)
}

pub fn google_maps_url(lat: f64, lng: f64) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}&travelmode=driving",
        lat, lng
    )
}

pub fn apple_maps_url(lat: f64, lng: f64) -> String {
    format!("https://maps.apple.com/?daddr={},{}&dirflg=d", lat, lng)
}

/// Whatever can open URLs for the user.
#[async_trait]
pub trait LaunchHost: Send + Sync {
    /// Replaces the current view with `url`.
    fn navigate(&self, url: &str) -> io::Result<()>;

    fn open_new_context(&self, url: &str) -> io::Result<()>;

    /// Resolves when the host loses focus, taken as "the app opened".
    async fn blurred(&self);
}

pub async fn launch(host: &dyn LaunchHost, plan: &LaunchPlan) -> io::Result<LaunchOutcome> {
    match plan {
        LaunchPlan::NewContext { url } => {
            host.open_new_context(url)?;
            Ok(LaunchOutcome::OpenedWeb)
        }
        LaunchPlan::AppWithFallback {
            app_url,
            web_url,
            fallback_after,
        } => {
            host.navigate(app_url)?;
            tokio::select! {
                _ = host.blurred() => Ok(LaunchOutcome::OpenedApp),
                _ = tokio::time::sleep(*fallback_after) => {
                    log::debug!("No app took over {}, opening {}", app_url, web_url);
                    host.navigate(web_url)?;
                    Ok(LaunchOutcome::FellBackToWeb)
                }
            }
        }
    }
}

/// Opens URLs with the desktop's default handler. Never reports a blur.
pub struct SystemLauncher;

#[async_trait]
impl LaunchHost for SystemLauncher {
    fn navigate(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }

    fn open_new_context(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }

    async fn blurred(&self) {
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    const IPHONE: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
    const PIXEL: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0";
    const MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/605.1.15";

    #[derive(Default)]
    struct RecordingHost {
        navigated: Mutex<Vec<String>>,
        opened: Mutex<Vec<String>>,
        blur: Notify,
        blurs: bool,
    }

    #[async_trait]
    impl LaunchHost for RecordingHost {
        fn navigate(&self, url: &str) -> io::Result<()> {
            self.navigated.lock().unwrap().push(url.to_string());
            Ok(())
        }

        fn open_new_context(&self, url: &str) -> io::Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn blurred(&self) {
            if self.blurs {
                return;
            }
            self.blur.notified().await;
        }
    }

    #[test]
    fn detects_mobile_platforms() {
        assert_eq!(Platform::from_user_agent(IPHONE), Platform::Ios);
        assert_eq!(Platform::from_user_agent(PIXEL), Platform::Android);
        assert_eq!(Platform::from_user_agent(MAC), Platform::Desktop);
        assert!(!Platform::Desktop.is_mobile());
    }

    #[test]
    fn waze_tries_app_on_mobile_only() {
        let builder = NavigationLinkBuilder::default();
        assert_eq!(
            builder.waze(1.3006, 103.8393, Platform::Ios),
            LaunchPlan::AppWithFallback {
                app_url: "waze://?ll=1.3006,103.8393&navigate=yes".to_string(),
                web_url: "https://waze.com/ul?ll=1.3006,103.8393&navigate=yes".to_string(),
                fallback_after: Duration::from_millis(500),
            }
        );
        assert_eq!(
            builder.waze(1.3006, 103.8393, Platform::Desktop),
            LaunchPlan::NewContext {
                url: "https://waze.com/ul?ll=1.3006,103.8393&navigate=yes".to_string()
            }
        );
    }

    #[test]
    fn google_maps_is_always_web() {
        let builder = NavigationLinkBuilder::default();
        for platform in [Platform::Ios, Platform::Android, Platform::Desktop] {
            assert_eq!(
                builder.plan(NavigationService::GoogleMaps, 1.3, 103.8, platform),
                LaunchPlan::NewContext {
                    url: "https://www.google.com/maps/dir/?api=1&destination=1.3,103.8&travelmode=driving"
                        .to_string()
                }
            );
        }
        assert_eq!(
            apple_maps_url(1.3, 103.8),
            "https://maps.apple.com/?daddr=1.3,103.8&dirflg=d"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_web_without_blur() {
        let host = RecordingHost::default();
        let plan = NavigationLinkBuilder::default().waze(1.3, 103.8, Platform::Android);

        let outcome = launch(&host, &plan).await.unwrap();
        assert_eq!(outcome, LaunchOutcome::FellBackToWeb);
        assert_eq!(
            *host.navigated.lock().unwrap(),
            [
                "waze://?ll=1.3,103.8&navigate=yes",
                "https://waze.com/ul?ll=1.3,103.8&navigate=yes"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn blur_cancels_the_fallback() {
        let host = RecordingHost {
            blurs: true,
            ..Default::default()
        };
        let plan = NavigationLinkBuilder::default().waze(1.3, 103.8, Platform::Ios);

        let outcome = launch(&host, &plan).await.unwrap();
        assert_eq!(outcome, LaunchOutcome::OpenedApp);
        assert_eq!(host.navigated.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn desktop_opens_new_context() {
        let host = RecordingHost::default();
        let plan = NavigationLinkBuilder::default().waze(1.3, 103.8, Platform::Desktop);

        assert_eq!(launch(&host, &plan).await.unwrap(), LaunchOutcome::OpenedWeb);
        assert!(host.navigated.lock().unwrap().is_empty());
        assert_eq!(host.opened.lock().unwrap().len(), 1);
    }
}
