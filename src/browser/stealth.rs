//! Per-page anti-detection overrides.
//!
//! Scripts are registered through `Page.addScriptToEvaluateOnNewDocument`
//! so they run before any site script on every navigation of the page.

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use tracing::debug;

// Injection order matters: the webdriver flag is the first thing most
// detectors probe.
const EVASION_SCRIPTS: &[&str] = &[
    // Hide the automation flag.
    r"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined
    });
    ",
    // Headless Chrome ships an empty plugin list; present the stock trio.
    r"
    const mockPlugins = [
        {
            name: 'Chrome PDF Plugin',
            description: 'Portable Document Format',
            filename: 'internal-pdf-viewer'
        },
        {
            name: 'Chrome PDF Viewer',
            description: '',
            filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai'
        },
        {
            name: 'Native Client',
            description: '',
            filename: 'internal-nacl-plugin'
        }
    ];
    Object.defineProperty(navigator, 'plugins', {
        get: () => {
            const plugins = {};
            mockPlugins.forEach((plugin, i) => {
                plugins[i] = plugin;
                plugins[plugin.name] = plugin;
            });
            Object.defineProperty(plugins, 'length', { value: mockPlugins.length });
            return plugins;
        }
    });
    ",
    // Consistent language preferences.
    r"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en']
    });
    ",
    // A real Chrome always exposes window.chrome.
    r"
    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: () => ({
                onMessage: { addListener: () => {}, removeListener: () => {} },
                postMessage: () => {}
            })
        };
    }
    ",
];

/// Register all evasion scripts on `page` and pin timezone and locale so
/// they match the advertised user agent.
pub async fn install(page: &Page) -> Result<()> {
    debug!("installing stealth overrides");
    for source in EVASION_SCRIPTS {
        page.execute(AddScriptToEvaluateOnNewDocumentParams {
            source: (*source).to_string(),
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        })
        .await?;
    }

    page.execute(SetTimezoneOverrideParams {
        timezone_id: "America/New_York".to_string(),
    })
    .await?;
    page.execute(SetLocaleOverrideParams {
        locale: Some("en-US".to_string()),
    })
    .await?;

    Ok(())
}
