use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn short_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_owned();
    }

    let mut label = name.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    label.push('…');
    label
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_cut_on_char_boundaries() {
        assert_eq!(short_label("TGF-β1", 10), "TGF-β1");
        assert_eq!(short_label("transforming growth factor", 8), "transfo…");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("C0016059");
        assert_eq!(stable_pair("C0016059"), (x, y));
        assert!((-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y));
    }
}
