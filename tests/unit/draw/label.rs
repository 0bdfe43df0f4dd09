use super::*;

#[test]
fn glyph_rows_become_runs() {
    let area = Area::new(0, 0, 4, 6);
    let runs = label_runs("I", area, area);
    assert_eq!(runs.len(), 7);
    assert_eq!(runs[0], Area::new(1, 0, 3, 0));
    assert_eq!(runs[1], Area::new(2, 1, 2, 1));
    assert_eq!(runs[6], Area::new(1, 6, 3, 6));
}

#[test]
fn lines_are_centered_in_the_box() {
    let area = Area::new(2, 2, 37, 21);
    let runs = label_runs(FALLBACK_LABEL, area, area);
    // "No" is 11 pixels wide and the two lines 15 tall.
    assert_eq!(runs[0], Area::new(14, 4, 14, 4));
    assert!(runs.iter().all(|r| r.y1 >= 4 && r.y2 <= 18));
    assert!(runs.iter().any(|r| r.y1 == 18));
}

#[test]
fn runs_are_cut_to_the_clip() {
    let area = Area::new(0, 0, 39, 19);
    let all = label_runs(FALLBACK_LABEL, area, area);
    let clip = Area::new(0, 0, 19, 9);
    let cut = label_runs(FALLBACK_LABEL, area, clip);
    assert!(!cut.is_empty());
    assert!(cut.len() < all.len());
    assert!(cut.iter().all(|r| r.intersect(&clip) == Some(*r)));
    assert!(label_runs(FALLBACK_LABEL, area, Area::new(100, 100, 101, 101)).is_empty());
}

#[test]
fn case_folds_and_unknown_characters_fall_back() {
    assert_eq!(glyph('a'), glyph('A'));
    assert_eq!(glyph('~'), glyph('?'));
    assert_eq!(glyph(' '), [0; 7]);
}
