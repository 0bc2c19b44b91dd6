//! Bit-grid finder: edit a marker grid by hand and look it up.
//!
//! The grid always carries a black border ring; only the interior is
//! editable. Lookups report a hit only on an exact code match. In
//! single-dictionary mode every toggle re-runs the lookup, while an
//! "any NxN" selection fans out over all dictionaries of that interior
//! size and waits for an explicit [`FinderTool::check`].

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use tagboard_dict::{BitMatrix, DictionaryProvider, DictionaryRegistry, Lookup};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::FinderError;

/// Interior sizes offered as "any dictionary" selections.
pub const ANY_SIZE_CLASSES: RangeInclusive<usize> = 4..=8;

const ANY_PREFIX: &str = "ANY_";

/// One cell of the finder grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCell {
    pub is_black: bool,
    pub is_border: bool,
}

/// `mark_size × mark_size` grid with a fixed black border.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerGrid {
    mark_size: usize,
    interior: BitMatrix,
}

impl MarkerGrid {
    /// Fresh grid with every interior cell black (`start_black`) or white.
    pub fn new(mark_size: usize, start_black: bool) -> Result<Self, FinderError> {
        if mark_size < 3 || mark_size - 2 > BitMatrix::MAX_SIDE {
            return Err(FinderError::UnsupportedSize(mark_size));
        }
        Ok(Self {
            mark_size,
            interior: BitMatrix::filled(mark_size - 2, !start_black)?,
        })
    }

    #[inline]
    pub fn mark_size(&self) -> usize {
        self.mark_size
    }

    #[inline]
    pub fn interior_size(&self) -> usize {
        self.mark_size - 2
    }

    fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row == self.mark_size - 1 || col == self.mark_size - 1
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<GridCell> {
        if row >= self.mark_size || col >= self.mark_size {
            return None;
        }
        if self.is_border(row, col) {
            return Some(GridCell {
                is_black: true,
                is_border: true,
            });
        }
        Some(GridCell {
            is_black: self.interior.is_black(row - 1, col - 1),
            is_border: false,
        })
    }

    /// Flip an interior cell. Border cells are left alone and yield `false`.
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<bool, FinderError> {
        if row >= self.mark_size || col >= self.mark_size {
            return Err(FinderError::OutOfRange { row, col });
        }
        if self.is_border(row, col) {
            debug!("ignoring toggle of border cell ({row}, {col})");
            return Ok(false);
        }
        let white = self.interior.is_white(row - 1, col - 1);
        self.interior.set_white(row - 1, col - 1, !white);
        Ok(true)
    }

    /// Interior cells as dictionary bits (black is `0`).
    #[inline]
    pub fn to_bits(&self) -> BitMatrix {
        self.interior
    }

    pub fn set_interior(&mut self, bits: BitMatrix) -> Result<(), FinderError> {
        if bits.side() != self.interior_size() {
            return Err(FinderError::UnsupportedSize(bits.side() + 2));
        }
        self.interior = bits;
        Ok(())
    }

    /// `new[i][j] = old[j][n-1-i]` on the interior.
    pub fn rotate_left(&mut self) {
        self.interior = self.interior.rotate_left();
    }

    /// `new[i][j] = old[n-1-j][i]` on the interior.
    pub fn rotate_right(&mut self) {
        self.interior = self.interior.rotate_right();
    }
}

/// Raw nearest-code lookup, exact or not.
pub fn lookup<D: DictionaryProvider + ?Sized>(bits: &BitMatrix, dict: &D) -> Option<Lookup> {
    dict.find(bits)
}

/// Id of the code equal to `bits`, if any.
pub fn match_single<D: DictionaryProvider + ?Sized>(bits: &BitMatrix, dict: &D) -> Option<u32> {
    lookup(bits, dict).filter(Lookup::is_exact).map(|l| l.id)
}

/// An exact hit in one dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinderMatch {
    pub dictionary: String,
    pub id: u32,
}

/// Exact hits across every dictionary whose interior side is `size_class`.
///
/// Several dictionaries may share a code; all hits are returned in the
/// order the dictionaries were given.
pub fn match_any<'a, D, I>(bits: &BitMatrix, size_class: usize, dictionaries: I) -> Vec<FinderMatch>
where
    D: DictionaryProvider + 'a,
    I: IntoIterator<Item = &'a D>,
{
    dictionaries
        .into_iter()
        .filter(|d| d.interior_size() == size_class)
        .filter_map(|d| {
            match_single(bits, d).map(|id| FinderMatch {
                dictionary: d.name().to_string(),
                id,
            })
        })
        .collect()
}

/// What the finder looks codes up in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinderSelection {
    Dictionary(String),
    /// Every dictionary with this interior size.
    AnySize(usize),
}

impl FinderSelection {
    pub fn is_any(&self) -> bool {
        matches!(self, Self::AnySize(_))
    }
}

impl FromStr for FinderSelection {
    type Err = FinderError;

    /// `ANY_5x5` selects a size class; anything else names a dictionary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(dims) = s.strip_prefix(ANY_PREFIX) else {
            return Ok(Self::Dictionary(s.to_string()));
        };
        let parsed = dims
            .split_once(['x', 'X'])
            .and_then(|(w, h)| Some((w.parse::<usize>().ok()?, h.parse::<usize>().ok()?)));
        match parsed {
            Some((w, h)) if w == h && ANY_SIZE_CLASSES.contains(&w) => Ok(Self::AnySize(w)),
            Some((w, _)) => Err(FinderError::UnsupportedSize(w)),
            None => Ok(Self::Dictionary(s.to_string())),
        }
    }
}

impl fmt::Display for FinderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dictionary(name) => f.write_str(name),
            Self::AnySize(n) => write!(f, "{ANY_PREFIX}{n}x{n}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinderState {
    Idle,
    GridDisplayed,
    Matching,
}

/// Result of one lookup, formatted for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    NoMatch,
    Found { id: u32 },
    FoundAny(Vec<FinderMatch>),
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        match self {
            Self::NoMatch => false,
            Self::Found { .. } => true,
            Self::FoundAny(hits) => !hits.is_empty(),
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found { id } => write!(f, "Match detected, ID: {id}"),
            Self::FoundAny(hits) if !hits.is_empty() => {
                f.write_str("Match detected: ")?;
                for (i, hit) in hits.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    write!(f, "{} ID: {}", hit.dictionary, hit.id)?;
                }
                Ok(())
            }
            _ => f.write_str("No match"),
        }
    }
}

/// Finder tool state: selection, grid and last result.
#[derive(Clone, Debug)]
pub struct FinderTool {
    registry: Arc<DictionaryRegistry>,
    selection: Option<FinderSelection>,
    start_black: bool,
    grid: Option<MarkerGrid>,
    state: FinderState,
    last: Option<MatchOutcome>,
}

impl FinderTool {
    pub fn new(registry: Arc<DictionaryRegistry>) -> Self {
        Self {
            registry,
            selection: None,
            start_black: true,
            grid: None,
            state: FinderState::Idle,
            last: None,
        }
    }

    #[inline]
    pub fn state(&self) -> FinderState {
        self.state
    }

    #[inline]
    pub fn selection(&self) -> Option<&FinderSelection> {
        self.selection.as_ref()
    }

    #[inline]
    pub fn grid(&self) -> Option<&MarkerGrid> {
        self.grid.as_ref()
    }

    #[inline]
    pub fn last_outcome(&self) -> Option<&MatchOutcome> {
        self.last.as_ref()
    }

    /// Initial interior color for grids generated from now on.
    pub fn set_start_black(&mut self, start_black: bool) {
        self.start_black = start_black;
    }

    /// Choose a dictionary or size class and show a fresh grid.
    pub fn select(&mut self, selection: FinderSelection) -> Result<&MarkerGrid, FinderError> {
        let mark_size = self.mark_size_for(&selection)?;
        let grid = MarkerGrid::new(mark_size, self.start_black)?;
        debug!("finder selection {selection} ({mark_size}x{mark_size} grid)");
        self.selection = Some(selection);
        Ok(self.show(grid))
    }

    /// Regenerate the grid for the current selection.
    pub fn generate(&mut self) -> Result<&MarkerGrid, FinderError> {
        let selection = self.selection.as_ref().ok_or(FinderError::NoSelection)?;
        let mark_size = self.mark_size_for(selection)?;
        let grid = MarkerGrid::new(mark_size, self.start_black)?;
        Ok(self.show(grid))
    }

    fn show(&mut self, grid: MarkerGrid) -> &MarkerGrid {
        self.last = None;
        self.state = FinderState::GridDisplayed;
        self.grid.insert(grid)
    }

    fn mark_size_for(&self, selection: &FinderSelection) -> Result<usize, FinderError> {
        match selection {
            FinderSelection::Dictionary(name) => Ok(self.registry.get(name)?.mark_size()),
            FinderSelection::AnySize(n) if ANY_SIZE_CLASSES.contains(n) => Ok(n + 2),
            FinderSelection::AnySize(n) => Err(FinderError::UnsupportedSize(*n)),
        }
    }

    fn grid_mut(&mut self) -> Result<&mut MarkerGrid, FinderError> {
        self.grid.as_mut().ok_or(FinderError::NoSelection)
    }

    /// Flip a cell. In single-dictionary mode the grid is re-checked at once.
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<Option<&MatchOutcome>, FinderError> {
        let changed = self.grid_mut()?.toggle(row, col)?;
        if !changed {
            return Ok(self.last.as_ref());
        }
        self.last = None;
        if self.selection.as_ref().is_some_and(|s| !s.is_any()) {
            self.check()?;
        }
        Ok(self.last.as_ref())
    }

    /// Look the current grid up in the selection.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn check(&mut self) -> Result<&MatchOutcome, FinderError> {
        let grid = self.grid.as_ref().ok_or(FinderError::NoSelection)?;
        let selection = self.selection.as_ref().ok_or(FinderError::NoSelection)?;
        let bits = grid.to_bits();
        self.state = FinderState::Matching;

        let result = match selection {
            FinderSelection::Dictionary(name) => self.registry.get(name).map(|dict| {
                match_single(&bits, dict).map_or(MatchOutcome::NoMatch, |id| MatchOutcome::Found { id })
            }),
            FinderSelection::AnySize(n) => {
                let hits = match_any(&bits, *n, self.registry.iter());
                Ok(if hits.is_empty() {
                    MatchOutcome::NoMatch
                } else {
                    MatchOutcome::FoundAny(hits)
                })
            }
        };
        self.state = FinderState::GridDisplayed;
        let outcome = result?;
        debug!("finder {selection}: {outcome}");
        Ok(self.last.insert(outcome))
    }

    /// Rotate the interior 90° counter-clockwise. Clears the last result.
    pub fn rotate_left(&mut self) -> Result<(), FinderError> {
        self.grid_mut()?.rotate_left();
        self.last = None;
        Ok(())
    }

    /// Rotate the interior 90° clockwise. Clears the last result.
    pub fn rotate_right(&mut self) -> Result<(), FinderError> {
        self.grid_mut()?.rotate_right();
        self.last = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagboard_dict::Dictionary;

    const CODES: [&str; 3] = ["0110011101001010", "1110010101001111", "0111100101100100"];

    fn registry() -> Arc<DictionaryRegistry> {
        let mut reg = DictionaryRegistry::new();
        reg.insert(Dictionary::from_bit_strings("A_4X4", 6, 0, &CODES).expect("dict"));
        Arc::new(reg)
    }

    fn paint(tool: &mut FinderTool, code: &str) {
        let bits = BitMatrix::from_bit_str(code).expect("bits");
        let n = bits.side();
        for row in 0..n {
            for col in 0..n {
                let cell = tool.grid().and_then(|g| g.cell(row + 1, col + 1)).expect("cell");
                if cell.is_black != bits.is_black(row, col) {
                    tool.toggle(row + 1, col + 1).expect("toggle");
                }
            }
        }
    }

    #[test]
    fn border_is_black_and_immutable() {
        let mut grid = MarkerGrid::new(6, false).expect("grid");
        assert_eq!(
            grid.cell(0, 3),
            Some(GridCell {
                is_black: true,
                is_border: true
            })
        );
        assert!(!grid.cell(2, 2).expect("cell").is_black);
        assert!(!grid.toggle(5, 1).expect("toggle"));
        assert!(grid.cell(5, 1).expect("cell").is_black);
        assert!(grid.toggle(6, 0).is_err());
    }

    #[test]
    fn selection_parses_any_size() {
        assert_eq!("ANY_5x5".parse::<FinderSelection>().ok(), Some(FinderSelection::AnySize(5)));
        assert_eq!(
            "DICT_4X4_50".parse::<FinderSelection>().ok(),
            Some(FinderSelection::Dictionary("DICT_4X4_50".into()))
        );
        assert!("ANY_9x9".parse::<FinderSelection>().is_err());
        assert_eq!(FinderSelection::AnySize(6).to_string(), "ANY_6x6");
    }

    #[test]
    fn single_mode_matches_on_toggle() {
        let mut tool = FinderTool::new(registry());
        assert_eq!(tool.state(), FinderState::Idle);
        tool.select(FinderSelection::Dictionary("A_4X4".into())).expect("select");
        assert_eq!(tool.state(), FinderState::GridDisplayed);

        paint(&mut tool, CODES[1]);
        let outcome = tool.last_outcome().expect("outcome");
        assert_eq!(outcome, &MatchOutcome::Found { id: 1 });
        assert_eq!(outcome.to_string(), "Match detected, ID: 1");
        assert_eq!(tool.state(), FinderState::GridDisplayed);

        tool.toggle(2, 2).expect("toggle");
        assert_eq!(tool.last_outcome().map(|o| o.to_string()).as_deref(), Some("No match"));
    }

    #[test]
    fn any_mode_needs_explicit_check() {
        let mut tool = FinderTool::new(registry());
        tool.select(FinderSelection::AnySize(4)).expect("select");
        paint(&mut tool, CODES[2]);
        assert!(tool.last_outcome().is_none());
        let outcome = tool.check().expect("check").clone();
        assert_eq!(
            outcome,
            MatchOutcome::FoundAny(vec![FinderMatch {
                dictionary: "A_4X4".into(),
                id: 2
            }])
        );
        assert_eq!(outcome.to_string(), "Match detected: A_4X4 ID: 2");
    }

    #[test]
    fn unknown_selection_keeps_previous_grid() {
        let mut tool = FinderTool::new(registry());
        assert!(matches!(tool.generate(), Err(FinderError::NoSelection)));
        tool.select(FinderSelection::AnySize(4)).expect("select");
        assert!(tool.select(FinderSelection::Dictionary("nope".into())).is_err());
        assert_eq!(tool.selection(), Some(&FinderSelection::AnySize(4)));
        assert_eq!(tool.grid().map(MarkerGrid::mark_size), Some(6));
    }

    #[test]
    fn rotation_clears_result() {
        let mut tool = FinderTool::new(registry());
        tool.select(FinderSelection::Dictionary("A_4X4".into())).expect("select");
        paint(&mut tool, CODES[0]);
        assert!(tool.last_outcome().is_some_and(MatchOutcome::is_match));
        tool.rotate_left().expect("rotate");
        assert!(tool.last_outcome().is_none());
        tool.rotate_right().expect("rotate");
        assert_eq!(tool.check().expect("check"), &MatchOutcome::Found { id: 0 });
    }
}
