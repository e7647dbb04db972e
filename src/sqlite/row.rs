use std::{fmt, rc::Rc};

use itertools::Itertools;

use crate::sqlite::record::CellValue;

/// One decoded result record: column aliases in projection order, each
/// paired with its value. Rows of the same result share their column list.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Rc<[Rc<str>]>,
    cells: Vec<CellValue>,
}

impl Row {
    pub fn new(columns: Rc<[Rc<str>]>, cells: Vec<CellValue>) -> Self {
        debug_assert_eq!(columns.len(), cells.len());
        Row { columns, cells }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<Rc<str>>,
    {
        let (columns, cells): (Vec<Rc<str>>, Vec<CellValue>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Row {
            columns: columns.into(),
            cells,
        }
    }

    /// Exact, case-sensitive lookup by column alias.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .position(|c| c.as_ref() == column)
            .map(|i| &self.cells[i])
    }

    pub fn columns(&self) -> &[Rc<str>] {
        &self.columns
    }

    pub fn values(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns.iter().map(|c| c.as_ref()).zip(self.cells.iter())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// Mapping equality: the same keys holding the same values, in any order.
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .sorted_by(|l, r| l.0.cmp(r.0))
                .zip(other.iter().sorted_by(|l, r| l.0.cmp(r.0)))
                .all(|(l, r)| l == r)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields = self.iter().map(|(column, value)| match value {
            CellValue::String(s) => format!("{column}: {s:?}"),
            v => format!("{column}: {v}"),
        });
        write!(f, "{{{}}}", fields.format(", "))
    }
}

/// Builds a [`Row`] from `"alias" => value` pairs.
///
/// ```ignore
/// let expected = row! { "count" => 723, "category" => "Sales and conversion optimization" };
/// ```
#[macro_export]
macro_rules! row {
    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::sqlite::row::Row::from_pairs([
            $(($column, $crate::sqlite::record::CellValue::from($value))),+
        ])
    };
}
