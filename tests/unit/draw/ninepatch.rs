use super::*;

#[test]
fn small_areas_are_not_planned() {
    assert!(NinePatch::plan(Area::new(0, 0, 6, 20), 4).is_none());
    assert!(NinePatch::plan(Area::new(0, 0, 7, 7), 4).is_some());
}

#[test]
fn pieces_tile_the_area_exactly() {
    let area = Area::new(10, 20, 49, 35);
    let np = NinePatch::plan(area, 5).unwrap();
    let pieces = np.pieces();
    assert_eq!(pieces.len(), 9);
    let total: u64 = pieces.iter().map(|p| p.area.size()).sum();
    assert_eq!(total, area.size());
    for (i, a) in pieces.iter().enumerate() {
        assert!(area.contains(&a.area));
        for b in &pieces[i + 1..] {
            assert!(!a.area.is_on(&b.area));
        }
    }
    let corners = pieces.iter().filter(|p| p.kind == PieceKind::Corner).count();
    assert_eq!(corners, 4);
    let br = pieces.last().unwrap();
    assert_eq!(br.flip, Flip::HV);
    assert_eq!(br.area, Area::new(45, 31, 49, 35));
}

#[test]
fn exact_fit_has_no_edges_or_center() {
    let np = NinePatch::plan(Area::new(0, 0, 7, 7), 4).unwrap();
    assert!(np.pieces().iter().all(|p| p.kind == PieceKind::Corner));
}

#[test]
fn rows_mirror_the_fragment() {
    let mut frag = OpaMap::new(3, 3).unwrap();
    for y in 0..3 {
        for x in 0..3 {
            frag.set(x, y, (10 * (y * 3 + x) + 10) as u8);
        }
    }
    let np = NinePatch::plan(Area::new(0, 0, 9, 7), 3).unwrap();
    let mut buf = [255u8; 12];
    np.mul_row(&frag, &mut buf, -1, 0);
    assert_eq!(buf, [0, 10, 20, 30, 30, 30, 30, 30, 30, 20, 10, 0]);

    let mut buf = [255u8; 10];
    np.mul_row(&frag, &mut buf, 0, 7);
    assert_eq!(buf, [10, 20, 30, 30, 30, 30, 30, 30, 20, 10]);

    let mut buf = [255u8; 10];
    np.mul_row(&frag, &mut buf, 0, 4);
    assert_eq!(buf[4], 90);
    assert_eq!(buf[0], 70);
}

#[test]
fn frag_sources_stay_inside_the_fragment() {
    let np = NinePatch::plan(Area::new(0, 0, 20, 20), 4).unwrap();
    let frag = Area::new(0, 0, 3, 3);
    for p in np.pieces() {
        assert!(frag.contains(&p.frag_src(4)));
    }
}
