use disease_network::network::{EntityGroup, Regulation};
use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn fade(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(17, 21, 27));

    let spacing = (48.0 * zoom.clamp(0.5, 2.0)).max(18.0);
    let anchor = rect.center() + pan;
    let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(58, 66, 78, 64));

    let first_x = rect.left() + (anchor.x - rect.left()).rem_euclid(spacing);
    let columns = std::iter::successors(Some(first_x), |x| Some(x + spacing));
    for x in columns.take_while(|x| *x <= rect.right()) {
        painter.vline(x, rect.y_range(), grid);
    }

    let first_y = rect.top() + (anchor.y - rect.top()).rem_euclid(spacing);
    let rows = std::iter::successors(Some(first_y), |y| Some(y + spacing));
    for y in rows.take_while(|y| *y <= rect.bottom()) {
        painter.hline(rect.x_range(), y, grid);
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// Clips the segment against `rect` grown by `padding` (Liang-Barsky).
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let bounds = rect.expand(padding);
    let delta = end - start;
    let (mut enter, mut leave) = (0.0_f32, 1.0_f32);

    let slabs = [
        (-delta.x, start.x - bounds.left()),
        (delta.x, bounds.right() - start.x),
        (-delta.y, start.y - bounds.top()),
        (delta.y, bounds.bottom() - start.y),
    ];
    for (direction, distance) in slabs {
        if direction == 0.0 {
            if distance < 0.0 {
                return false;
            }
            continue;
        }

        let t = distance / direction;
        if direction < 0.0 {
            enter = enter.max(t);
        } else {
            leave = leave.min(t);
        }
        if enter > leave {
            return false;
        }
    }
    true
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

pub(super) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

pub(super) fn node_radius(degree: usize) -> f32 {
    (5.0 + (degree as f32).sqrt() * 2.6).min(26.0)
}

pub(super) fn regulation_color(regulation: Regulation) -> Color32 {
    match regulation {
        Regulation::Positive => Color32::from_rgb(92, 184, 92),
        Regulation::Negative => Color32::from_rgb(217, 83, 79),
        Regulation::Mixed => Color32::from_rgb(240, 173, 78),
        Regulation::Neutral => Color32::from_rgb(150, 156, 166),
        Regulation::Unspecified => Color32::from_rgb(98, 104, 114),
    }
}

pub(super) fn group_color(group: EntityGroup) -> Color32 {
    match group {
        EntityGroup::Phenotype => Color32::from_rgb(231, 111, 81),
        EntityGroup::Organ => Color32::from_rgb(244, 162, 97),
        EntityGroup::Cell => Color32::from_rgb(233, 196, 106),
        EntityGroup::Organelle => Color32::from_rgb(138, 177, 125),
        EntityGroup::Molecule => Color32::from_rgb(42, 157, 143),
        EntityGroup::Unknown => Color32::from_rgb(140, 140, 150),
    }
}
