/// Top-down view of the open book
///
/// Two page-sized halves meet at the spine. Each half shows its static page,
/// with the front cover or the turning sheet laid over it, foreshortened by
/// how far it has risen from the table.

use std::f32::consts::FRAC_PI_2;

use cgmath::Vector3;
use iced::alignment::Horizontal;
use iced::widget::image::Handle;
use iced::widget::{container, image, row, stack, Space};
use iced::{ContentFit, Element, Length, Size};

use crate::book::controller::RenderState;
use crate::book::layout::{PAGE_H, PAGE_W};
use crate::book::surface::deform_point;
use crate::page::cache::PageTexture;
use crate::Message;

/// Vertical space reserved for the toolbar and the profile strip
const CHROME_HEIGHT: f32 = 260.0;
/// Horizontal space reserved for the arrow buttons
const CHROME_WIDTH: f32 = 160.0;
const MIN_PAGE_HEIGHT: f32 = 120.0;

/// On-screen size of one page for a viewport
pub fn page_size(viewport: Size) -> Size {
    let aspect = PAGE_H / PAGE_W;
    let by_height = viewport.height - CHROME_HEIGHT;
    let by_width = (viewport.width - CHROME_WIDTH) / 2.0 * aspect;
    let height = by_height.min(by_width).max(MIN_PAGE_HEIGHT);
    Size::new(height / aspect, height)
}

/// Share of the page width the free edge covers at `progress`, measured
/// from the spine on the side it is currently over
pub fn sheet_extent(progress: f32) -> f32 {
    let edge = deform_point(Vector3::new(PAGE_W, 0.0, 0.0), progress, 0.0);
    (edge.x / PAGE_W).abs().min(1.0)
}

fn page_image<'a>(texture: &PageTexture, width: f32, height: f32) -> Element<'a, Message> {
    image(texture.handle())
        .width(Length::Fixed(width.max(1.0)))
        .height(Length::Fixed(height))
        .content_fit(ContentFit::Fill)
        .into()
}

fn half<'a>(
    layers: Vec<Element<'a, Message>>,
    size: Size,
    spine: Horizontal,
) -> Element<'a, Message> {
    let aligned: Vec<Element<'a, Message>> = layers
        .into_iter()
        .map(|layer| {
            container(layer)
                .width(Length::Fixed(size.width))
                .height(Length::Fixed(size.height))
                .align_x(spine)
                .into()
        })
        .collect();

    if aligned.is_empty() {
        Space::new(Length::Fixed(size.width), Length::Fixed(size.height)).into()
    } else {
        stack(aligned).into()
    }
}

/// One image laid over a half, as a share of the page width
pub struct Layer<'f> {
    pub texture: &'f PageTexture,
    pub extent: f32,
}

/// Left and right layers, bottom first
///
/// The open cover lies under the left stack, the closed cover over the
/// right one. The turning sheet is always on top.
pub fn layers(frame: &RenderState) -> (Vec<Layer<'_>>, Vec<Layer<'_>>) {
    let mut left = Vec::new();
    let mut right = Vec::new();

    let angle = frame.cover.rotation;
    let cover = angle.cos().abs();
    if angle >= FRAC_PI_2 {
        left.push(Layer {
            texture: &frame.contents,
            extent: cover,
        });
    }

    if let Some(page) = &frame.left {
        left.push(Layer {
            texture: &page.texture,
            extent: 1.0,
        });
    }
    if let Some(page) = &frame.right {
        right.push(Layer {
            texture: &page.texture,
            extent: 1.0,
        });
    }

    if angle < FRAC_PI_2 {
        right.push(Layer {
            texture: &frame.cover_texture,
            extent: cover,
        });
    }

    if let Some(sheet) = &frame.sheet {
        let extent = sheet_extent(sheet.progress);
        let (side, face) = if sheet.progress < 0.5 {
            (&mut right, &sheet.front)
        } else {
            (&mut left, &sheet.back_upright)
        };
        if let Some(texture) = face {
            side.push(Layer { texture, extent });
        }
    }

    (left, right)
}

/// The spread, either as the rendered mesh `scene` or as flat image layers
pub fn view<'a>(frame: &RenderState, scene: Option<&Handle>, size: Size) -> Element<'a, Message> {
    if let Some(scene) = scene {
        return image(scene.clone())
            .width(Length::Fixed(size.width * 2.0))
            .height(Length::Fixed(size.height))
            .content_fit(ContentFit::Fill)
            .into();
    }

    let (left, right) = layers(frame);
    let images = |layers: Vec<Layer<'_>>| -> Vec<Element<'a, Message>> {
        layers
            .into_iter()
            .map(|layer| page_image(layer.texture, size.width * layer.extent, size.height))
            .collect()
    };

    row![
        half(images(left), size, Horizontal::Right),
        half(images(right), size, Horizontal::Left),
    ]
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::controller::Book;
    use crate::state::config::BookConfig;
    use crate::state::pages::CONTENTS_PAGE;
    use crate::state::quality::Quality;
    use crate::state::store::fixtures::store_with;

    fn pages(layers: &[Layer<'_>]) -> Vec<usize> {
        layers.iter().map(|layer| layer.texture.key.page).collect()
    }

    fn book() -> Book {
        let config = BookConfig {
            quality: Quality::Low,
            paper_grain: false,
            ..BookConfig::default()
        };
        Book::new(store_with(6), &config)
    }

    #[test]
    fn test_closed_cover_on_the_right() {
        let book = book();
        let (left, right) = layers(book.frame());
        assert!(left.is_empty());
        assert_eq!(right.last().map(|layer| layer.texture.key.page), Some(0));
    }

    #[test]
    fn test_open_cover_under_left_page() {
        let mut book = book();
        book.jump_to(2);
        for _ in 0..600 {
            book.step(1.0 / 60.0);
        }

        let (left, _) = layers(book.frame());
        let left_pages = pages(&left);
        assert_eq!(left_pages.first(), Some(&CONTENTS_PAGE));
        assert_eq!(left_pages.len(), 2);
        assert_eq!(left[1].extent, 1.0);
    }

    #[test]
    fn test_page_size_keeps_aspect() {
        let size = page_size(Size::new(1280.0, 860.0));
        assert!((size.height / size.width - PAGE_H / PAGE_W).abs() < 1e-4);
        assert!(size.width * 2.0 <= 1280.0 - CHROME_WIDTH + 1e-3);
        assert!(size.height <= 860.0 - CHROME_HEIGHT + 1e-3);
    }

    #[test]
    fn test_tiny_viewport_has_floor() {
        let size = page_size(Size::new(100.0, 100.0));
        assert_eq!(size.height, MIN_PAGE_HEIGHT);
    }

    #[test]
    fn test_sheet_extent() {
        assert!((sheet_extent(0.0) - 1.0).abs() < 1e-5);
        assert!((sheet_extent(1.0) - 1.0).abs() < 1e-5);
        // Mid-turn the sheet stands past vertical, seen nearly edge-on
        assert!(sheet_extent(0.5) < 0.35);
    }
}
