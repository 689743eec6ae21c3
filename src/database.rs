//! Salsa database and the source input every query hangs off.

/// Options that change what the pipeline reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CheckOptions {
    /// Evaluate `Records` rows against keys and relationships.
    pub check_records: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_records: true,
        }
    }
}

/// One DBML document.
#[salsa::input(debug)]
pub struct SourceFile {
    #[returns(deref)]
    pub text: String,
    pub options: CheckOptions,
}

#[derive(Default, Clone)]
#[salsa::db]
pub struct DbmlDatabase {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for DbmlDatabase {}
