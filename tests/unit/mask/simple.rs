use super::*;

#[test]
fn rect_clip_cuts_row_ends() {
    let m = RectMask {
        area: Area::new(2, 0, 4, 10),
    };
    let mut buf = [255u8; 8];
    assert_eq!(m.apply_row(&mut buf, 0, 5), MaskResult::Changed);
    assert_eq!(buf, [0, 0, 255, 255, 255, 0, 0, 0]);

    let mut buf = [255u8; 3];
    assert_eq!(m.apply_row(&mut buf, 2, 5), MaskResult::FullCover);
    assert_eq!(m.apply_row(&mut buf, 2, 11), MaskResult::Transparent);
    assert_eq!(buf, [0; 3]);
}

#[test]
fn fade_interpolates_between_rows() {
    let m = FadeMask {
        area: Area::new(0, 0, 9, 100),
        opa_top: 255,
        y_top: 10,
        opa_bottom: 0,
        y_bottom: 20,
    };
    assert_eq!(m.row_opa(0), 255);
    assert_eq!(m.row_opa(15), 128);
    assert_eq!(m.row_opa(50), 0);

    let mut buf = [255u8; 12];
    assert_eq!(m.apply_row(&mut buf, 0, 15), MaskResult::Changed);
    assert_eq!(buf[0], 128);
    assert_eq!(buf[10], 255);
    assert_eq!(m.apply_row(&mut buf, 0, 200), MaskResult::FullCover);
}

#[test]
fn map_mask_reads_bitmap_and_zeroes_outside() {
    let mut map = OpaMap::new(2, 2).unwrap();
    map.set(0, 0, 10);
    map.set(1, 0, 255);
    map.set(0, 1, 0);
    map.set(1, 1, 77);
    let m = MapMask {
        area: Area::new(5, 5, 6, 6),
        map: Arc::new(map),
    };
    let mut buf = [255u8; 4];
    assert_eq!(m.apply_row(&mut buf, 4, 5), MaskResult::Changed);
    assert_eq!(buf, [0, 10, 255, 0]);
    let mut buf = [255u8; 2];
    assert_eq!(m.apply_row(&mut buf, 5, 9), MaskResult::Transparent);
}
