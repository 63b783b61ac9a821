//! Single-page tab state: which named panel is shown and which nav link is
//! marked active. Exactly one panel is visible once a panel has been
//! activated; before that, none is.

use serde::Serialize;

use crate::error::TabError;

pub const DEFAULT_PANEL: &str = "dashboard";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub name: String,
    pub title: String,
}

impl Panel {
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
        }
    }

    /// Anchor target of the nav link for this panel.
    pub fn href(&self) -> String {
        format!("#{}", self.name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TabController {
    panels: Vec<Panel>,
    active: Option<usize>,
}

impl TabController {
    /// Panels are identified by name; a repeated name keeps only its first
    /// panel.
    pub fn new(panels: Vec<Panel>) -> Self {
        let mut unique: Vec<Panel> = Vec::with_capacity(panels.len());
        for panel in panels {
            if !unique.iter().any(|p| p.name == panel.name) {
                unique.push(panel);
            }
        }
        Self {
            panels: unique,
            active: None,
        }
    }

    /// Dashboard charts, persona cards, and the action log.
    pub fn with_default_panels() -> Self {
        Self::new(vec![
            Panel::new(DEFAULT_PANEL, "Dashboard"),
            Panel::new("personas", "Personas"),
            Panel::new("logs", "Action Logs"),
        ])
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn set_active_panel(&mut self, name: &str) -> Result<(), TabError> {
        let idx = self
            .panels
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| TabError::UnknownPanel(name.to_string()))?;
        self.active = Some(idx);
        Ok(())
    }

    /// Nav click: the link target names the panel, with or without `#`.
    pub fn navigate(&mut self, href: &str) -> Result<(), TabError> {
        self.set_active_panel(href.strip_prefix('#').unwrap_or(href))
    }

    pub fn active(&self) -> Option<&Panel> {
        self.active.map(|i| &self.panels[i])
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.active().map(|p| p.name == name).unwrap_or(false)
    }

    pub fn visible_panels(&self) -> Vec<&Panel> {
        self.panels.iter().filter(|p| self.is_visible(&p.name)).collect()
    }

    /// Hrefs of links carrying the active marker.
    pub fn active_links(&self) -> Vec<String> {
        self.active().map(|p| vec![p.href()]).unwrap_or_default()
    }
}
