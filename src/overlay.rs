//! The "please rotate your device" prompt.
//!
//! [`OverlaySpec`] is what gets inserted into the document, [`PromptHandle`]
//! is what the adapter keeps while it is shown: the resize observer and the
//! fallback timer that both have to go away together with the node.

use crate::{
    config::AdapterConfig,
    host::{Host, ListenerId, TimerId},
};

const OVERLAY_CSS: &str = "position: fixed; \
top: 0; \
left: 0; \
width: 100%; \
height: 100%; \
background: rgba(0, 0, 0, 0.9); \
color: white; \
display: flex; \
flex-direction: column; \
justify-content: center; \
align-items: center; \
z-index: 9999; \
font-family: Arial, sans-serif; \
text-align: center; \
padding: 20px;";

/// A full-viewport node ready to be appended to `<body>`.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    pub id: String,
    /// Inline `style` attribute.
    pub css: String,
    pub inner_html: String,
}

impl OverlaySpec {
    pub fn rotation_prompt(config: &AdapterConfig) -> Self {
        let inner_html = format!(
            "<div style=\"font-size: 24px; margin-bottom: 20px;\">{}</div>\
             <div style=\"font-size: 18px; margin-bottom: 15px;\">{}</div>\
             <div style=\"font-size: 14px; color: #ccc;\">{}</div>",
            escape_html(&config.prompt_icon),
            escape_html(&config.prompt_title),
            escape_html(&config.prompt_hint),
        );
        Self {
            id: config.prompt_id.clone(),
            css: OVERLAY_CSS.to_string(),
            inner_html,
        }
    }
}

/// Rules injected once per page: no text selection, callouts or pinch zoom on
/// small screens.
pub fn touch_style(config: &AdapterConfig) -> String {
    format!(
        "@media screen and (max-width: {breakpoint}px) {{
    body {{
        -webkit-touch-callout: none;
        -webkit-user-select: none;
        -khtml-user-select: none;
        -moz-user-select: none;
        -ms-user-select: none;
        user-select: none;
        touch-action: manipulation;
    }}

    #{id} {{
        font-size: 16px;
    }}
}}
",
        breakpoint = config.style_breakpoint,
        id = config.prompt_id,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Listener and timer tied to the prompt currently on screen.
#[derive(Debug, Default)]
pub struct PromptHandle {
    pub resize: Option<ListenerId>,
    pub timer: Option<TimerId>,
}

impl PromptHandle {
    /// Removes the node and deregisters everything attached to it.
    pub fn release<H: Host + ?Sized>(self, host: &H, prompt_id: &str) {
        if let Some(id) = self.resize {
            host.unlisten(id);
        }
        if let Some(id) = self.timer {
            host.clear_timeout(id);
        }
        host.remove_element(prompt_id);
    }
}
