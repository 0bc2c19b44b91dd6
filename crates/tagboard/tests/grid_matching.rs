use std::path::{Path, PathBuf};
use std::sync::Arc;

use tagboard::dict::{BitMatrix, DictionaryProvider, DictionaryRegistry, Matcher};
use tagboard::finder::{lookup, match_any, match_single};
use tagboard::{FinderMatch, FinderSelection, FinderTool, MarkerGrid, MatchOutcome};

fn testdata_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata")
        .join(name)
}

fn registry() -> Arc<DictionaryRegistry> {
    let mut reg = DictionaryRegistry::new();
    reg.load_json_file(testdata_path("dictionaries.json"))
        .expect("load dictionaries");
    Arc::new(reg)
}

fn set_grid(tool: &mut FinderTool, bits: &BitMatrix) {
    let n = bits.side();
    for row in 0..n {
        for col in 0..n {
            let cell = tool
                .grid()
                .and_then(|g| g.cell(row + 1, col + 1))
                .expect("cell");
            if cell.is_black != bits.is_black(row, col) {
                tool.toggle(row + 1, col + 1).expect("toggle");
            }
        }
    }
}

#[test]
fn every_code_matches_itself_exactly() {
    let reg = registry();
    for dict in reg.iter() {
        for id in 0..dict.code_count() as u32 {
            let bits = dict.code(id).expect("code");
            assert_eq!(match_single(&bits, dict), Some(id), "{} id {id}", dict.name);
        }
    }
}

#[test]
fn single_bit_flip_is_not_a_match() {
    let reg = registry();
    let dict = reg.get("TEST_4X4_A").expect("dict");
    let mut bits = dict.code(1).expect("code");
    bits.set_white(2, 3, !bits.is_white(2, 3));

    let nearest = lookup(&bits, dict).expect("lookup");
    assert!(nearest.distance >= 1);
    assert_eq!(match_single(&bits, dict), None);
}

#[test]
fn shared_code_reports_every_dictionary() {
    let reg = registry();
    let shared = reg.get("TEST_4X4_A").expect("dict").code(2).expect("code");

    let hits = match_any(&shared, 4, reg.iter());
    assert_eq!(
        hits,
        vec![
            FinderMatch {
                dictionary: "TEST_4X4_A".into(),
                id: 2
            },
            FinderMatch {
                dictionary: "TEST_4X4_B".into(),
                id: 1
            },
        ]
    );
    assert!(match_any(&shared, 5, reg.iter()).is_empty());

    let mut tool = FinderTool::new(reg);
    tool.select("ANY_4x4".parse().expect("selection"))
        .expect("select");
    set_grid(&mut tool, &shared);
    let outcome = tool.check().expect("check");
    assert_eq!(
        outcome.to_string(),
        "Match detected: TEST_4X4_A ID: 2 and TEST_4X4_B ID: 1"
    );
}

#[test]
fn rotation_has_order_four() {
    for mark_size in 5..=10 {
        let n = mark_size - 2;
        let code = (0..n * n).fold(0u64, |acc, i| acc | (((i * 7 + 3) % 5 == 0) as u64) << i);
        let mut grid = MarkerGrid::new(mark_size, true).expect("grid");
        grid.set_interior(BitMatrix::from_code(n, code).expect("bits"))
            .expect("interior");
        let original = grid.clone();

        grid.rotate_left();
        assert_ne!(grid, original, "size {mark_size}");
        for _ in 0..3 {
            grid.rotate_left();
        }
        assert_eq!(grid, original, "size {mark_size}");

        grid.rotate_left();
        grid.rotate_right();
        assert_eq!(grid, original, "size {mark_size}");
    }
}

#[test]
fn rotated_grid_is_found_by_rotation_aware_matcher() {
    let reg = registry();
    let dict = reg.get("TEST_5X5").expect("dict");
    let matcher = Matcher::new(dict, 0);

    let mut tool = FinderTool::new(Arc::clone(&reg));
    tool.select(FinderSelection::Dictionary("TEST_5X5".into()))
        .expect("select");
    set_grid(&mut tool, &dict.code(3).expect("code"));
    assert_eq!(tool.last_outcome(), Some(&MatchOutcome::Found { id: 3 }));

    tool.rotate_right().expect("rotate");
    let bits = tool.grid().expect("grid").to_bits();
    assert_eq!(match_single(&bits, dict), None);
    let m = matcher.match_bits(&bits).expect("rotated match");
    assert_eq!((m.id, m.rotation, m.hamming), (3, 1, 0));
}

#[test]
fn start_white_grid_and_regenerate() {
    let mut tool = FinderTool::new(registry());
    tool.set_start_black(false);
    tool.select(FinderSelection::AnySize(5)).expect("select");
    let grid = tool.grid().expect("grid");
    assert_eq!(grid.mark_size(), 7);
    assert!(!grid.cell(3, 3).expect("cell").is_black);

    tool.toggle(3, 3).expect("toggle");
    tool.set_start_black(true);
    let grid = tool.generate().expect("generate");
    assert!(grid.cell(3, 3).expect("cell").is_black);
    assert_eq!(grid.to_bits().code(), 0);
}
