/// Toolbar and side panels
///
/// The toolbar toggles the contents and settings panels; the arrow buttons
/// sit either side of the spread. Panels only ever send intents and read
/// navigation flags.

use iced::widget::{button, column, container, text, Column};
use iced::{Alignment, Element, Length};
use iced_aw::Wrap;

use crate::book::{Book, Direction};
use crate::state::data::Entity;
use crate::state::navigation::{NavigationState, Panel};
use crate::state::pages::PageMap;
use crate::state::quality::Quality;
use crate::Message;

/// Height of the toolbar strip at the top of the window
pub const TOOLBAR_HEIGHT: f32 = 52.0;

/// One row of the contents panel
#[derive(Debug, Clone, PartialEq)]
pub struct ContentsEntry {
    pub label: String,
    /// Size and weight, entries only
    pub detail: Option<String>,
    pub spread: usize,
}

/// Cover, every entry, back cover
pub fn contents_entries<'a>(
    entities: impl Iterator<Item = &'a Entity>,
    map: &PageMap,
) -> Vec<ContentsEntry> {
    let mut entries = vec![ContentsEntry {
        label: "Cover".to_string(),
        detail: None,
        spread: 0,
    }];

    entries.extend(entities.enumerate().map(|(i, entity)| ContentsEntry {
        label: format!("{}. {}", i + 1, entity.name_en),
        detail: Some(format!("{} · {}", entity.size.label().to_lowercase(), entity.weight)),
        spread: map.spread_of_entry(i),
    }));

    entries.push(ContentsEntry {
        label: "Back Cover".to_string(),
        detail: None,
        spread: map.leaves(),
    });
    entries
}

fn toggle<'a>(label: &'a str, active: bool, message: Message) -> Element<'a, Message> {
    button(text(label).size(13))
        .style(if active { button::primary } else { button::secondary })
        .padding([6, 12])
        .on_press(message)
        .into()
}

pub fn toolbar<'a>(nav: &NavigationState) -> Element<'a, Message> {
    let panel = nav.panel();
    let indicator = match nav.spread() {
        0 => "Closed".to_string(),
        s if s == nav.leaves() => "The End".to_string(),
        s => format!("Spread {} / {}", s, nav.leaves()),
    };

    iced::widget::row![
        toggle("☰ Contents", panel == Some(Panel::Contents), Message::ToggleContents),
        toggle("⚙ Settings", panel == Some(Panel::Settings), Message::ToggleSettings),
        iced::widget::horizontal_space(),
        text(indicator).size(13),
    ]
    .spacing(8)
    .padding([10, 16])
    .height(Length::Fixed(TOOLBAR_HEIGHT))
    .align_y(Alignment::Center)
    .into()
}

/// Previous / next arrow; disabled while animating or at the edge
pub fn arrow<'a>(direction: Direction, nav: &NavigationState) -> Element<'a, Message> {
    let (glyph, enabled) = match direction {
        Direction::Backward => ("‹", nav.can_prev()),
        Direction::Forward => ("›", nav.can_next()),
    };

    button(text(glyph).size(28).center())
        .width(Length::Fixed(44.0))
        .height(Length::Fixed(44.0))
        .style(button::text)
        .on_press_maybe(enabled.then_some(Message::Turn(direction)))
        .into()
}

pub fn contents_panel<'a>(book: &Book) -> Element<'a, Message> {
    let animating = book.nav().is_animating();

    let items: Vec<Element<'a, Message>> =
        contents_entries(book.store().iter(), book.map())
            .into_iter()
            .map(|entry| {
                let mut label: Column<'a, Message> = column![text(entry.label).size(13)];
                if let Some(detail) = entry.detail {
                    label = label.push(text(detail).size(10));
                }
                button(label)
                    .width(Length::Fixed(180.0))
                    .style(button::secondary)
                    .on_press_maybe((!animating).then_some(Message::JumpTo(entry.spread)))
                    .into()
            })
            .collect();

    panel(
        "TABLE OF CONTENTS",
        Wrap::with_elements(items).spacing(6.0).line_spacing(6.0).into(),
    )
}

pub fn settings_panel<'a>(book: &Book) -> Element<'a, Message> {
    let current = book.nav().quality();

    let tiers: Vec<Element<'a, Message>> = Quality::ALL
        .into_iter()
        .map(|quality| {
            button(text(quality.label()).size(13))
                .style(if quality == current {
                    button::primary
                } else {
                    button::secondary
                })
                .padding([6, 14])
                .on_press(Message::SetQuality(quality))
                .into()
        })
        .collect();

    let photos = if book.photos_ready() {
        "Photos loaded"
    } else {
        "Loading photos..."
    };

    panel(
        "SETTINGS",
        column![
            text("Quality").size(12),
            Wrap::with_elements(tiers).spacing(6.0),
            text(photos).size(11),
        ]
        .spacing(10)
        .into(),
    )
}

fn panel<'a>(title: &'a str, body: Element<'a, Message>) -> Element<'a, Message> {
    container(column![text(title).size(14), body].spacing(12))
        .padding(16)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::store::ContentStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_contents_entries() {
        let store = ContentStore::builtin().unwrap();
        let map = PageMap::new(store.len());
        let entries = contents_entries(store.iter(), &map);

        assert_eq!(entries.len(), store.len() + 2);
        assert_eq!(entries[0].spread, 0);
        assert_eq!(entries.last().unwrap().label, "Back Cover");
        assert_eq!(entries.last().unwrap().spread, 15);

        // Entry 5 (0-based 4) sits on page 6, spread 3; entry 6 on page 7, spread 4
        assert_eq!(entries[5].spread, 3);
        assert_eq!(entries[6].spread, 4);
        assert!(entries[1].label.starts_with("1. "));
        assert!(entries[1].detail.is_some());
    }
}
