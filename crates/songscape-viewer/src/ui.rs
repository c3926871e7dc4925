//! egui overlay: coordinate readout, hover tooltip and selection card.

use egui::{Align2, Color32, RichText};
use songscape::{Candidate, DensityTier, ViewEvent, ViewportReadout};

const HUD_CYAN: Color32 = Color32::from_rgb(45, 247, 255);

/// What the HUD shows, kept current from the session's events.
#[derive(Debug, Default)]
pub struct HudState {
    pub readout: Option<ViewportReadout>,
    pub hovered: Option<Candidate>,
    pub selected: Option<Candidate>,
}

impl HudState {
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::ViewportChanged(readout) => self.readout = Some(readout),
            ViewEvent::HoverChanged(candidate) => self.hovered = candidate,
            ViewEvent::SelectionChanged(candidate) => self.selected = candidate,
        }
    }
}

/// Per-frame figures that do not come from events.
pub struct HudStats {
    pub tier: DensityTier,
    pub points: u32,
    pub candidates: usize,
    /// Screen position (egui points) of the hovered song.
    pub hover_anchor: Option<egui::Pos2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudAction {
    None,
    CloseSelection,
}

pub fn readout_line(r: &ViewportReadout) -> String {
    format!("POS: {:.3}, {:.3} | ZOOM: {:.2}x", r.world_x, r.world_y, r.zoom)
}

/// Short one-line-per-field description used by the tooltip.
pub fn song_lines(c: &Candidate) -> Vec<String> {
    let d = &c.data;
    let mut lines = Vec::with_capacity(3);
    if !d.artists.is_empty() {
        lines.push(d.artists.clone());
    }
    match (d.year, d.energy) {
        (Some(year), Some(energy)) => lines.push(format!("{year} · energy {energy:.2}")),
        (Some(year), None) => lines.push(year.to_string()),
        (None, Some(energy)) => lines.push(format!("energy {energy:.2}")),
        (None, None) => {}
    }
    lines
}

fn title(c: &Candidate) -> &str {
    if c.data.name.is_empty() {
        "Untitled"
    } else {
        &c.data.name
    }
}

pub fn draw_hud(ctx: &egui::Context, hud: &HudState, stats: &HudStats) -> HudAction {
    let mut action = HudAction::None;

    egui::Area::new(egui::Id::new("hud_readout"))
        .anchor(Align2::LEFT_BOTTOM, [12.0, -12.0])
        .interactable(false)
        .show(ctx, |ui| {
            if let Some(r) = &hud.readout {
                ui.label(RichText::new(readout_line(r)).monospace().color(HUD_CYAN));
            }
            ui.label(
                RichText::new(format!(
                    "{} points ({}) | {} nearby",
                    stats.points, stats.tier, stats.candidates
                ))
                .monospace()
                .small(),
            );
        });

    if let (Some(song), Some(anchor)) = (&hud.hovered, stats.hover_anchor) {
        egui::Area::new(egui::Id::new("hud_hover"))
            .fixed_pos(anchor + egui::vec2(16.0, 16.0))
            .order(egui::Order::Tooltip)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(title(song)).strong());
                    for line in song_lines(song) {
                        ui.label(line);
                    }
                });
            });
    }

    if let Some(song) = &hud.selected {
        egui::Window::new("Selected")
            .anchor(Align2::RIGHT_TOP, [-12.0, 12.0])
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(RichText::new(title(song)).heading());
                for line in song_lines(song) {
                    ui.label(line);
                }
                if let Some(album) = &song.data.album {
                    ui.label(RichText::new(album).italics());
                }
                if ui.button("Close").clicked() {
                    action = HudAction::CloseSelection;
                }
            });
    }

    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use songscape::SongAttributes;

    fn song() -> Candidate {
        Candidate {
            id: 9u64.into(),
            x: 0.0,
            y: 0.0,
            data: SongAttributes {
                name: "Teardrop".into(),
                artists: "Massive Attack".into(),
                year: Some(1998),
                energy: Some(0.5),
                ..SongAttributes::default()
            },
        }
    }

    #[test]
    fn readout_format() {
        let r = ViewportReadout::new(0.12345, -1.0, 2.5);
        assert_eq!(readout_line(&r), "POS: 0.123, -1.000 | ZOOM: 2.50x");
    }

    #[test]
    fn events_update_state() {
        let mut hud = HudState::default();
        hud.apply(ViewEvent::HoverChanged(Some(song())));
        hud.apply(ViewEvent::SelectionChanged(Some(song())));
        assert_eq!(hud.hovered.as_ref().map(|c| c.id.clone()), Some(9u64.into()));
        hud.apply(ViewEvent::SelectionChanged(None));
        assert!(hud.selected.is_none());
        assert!(hud.hovered.is_some());
    }

    #[test]
    fn tooltip_lines() {
        assert_eq!(song_lines(&song()), vec!["Massive Attack", "1998 · energy 0.50"]);
        let mut bare = song();
        bare.data = SongAttributes::default();
        assert!(song_lines(&bare).is_empty());
        assert_eq!(title(&bare), "Untitled");
    }
}
