/// Join key identifying one scanned volume across annotation and token tables.
/// Examples: `v.3 no.24 1965`, `June-July 1965`
pub type VolumeId = String;
/// Identifier assigned by the digitization repository to a volume.
/// Example: `mdp.39015004861985`
pub type HathiId = String;
/// 1-based physical page position within a scanned volume.
pub type Sequence = u32;
/// Case-insensitive title fragment used to select per-title configuration.
/// Examples: `arab_observer`, `afro_asian_bulletin`
pub type TitleKey = String;
/// Normalized (snake_case) column name.
/// Examples: `type_of_page`, `issue_number`
pub type ColumnName = String;
/// Raw cell text as read from a table.
pub type CellValue = String;
/// Search term used by coverage metrics.
/// Examples: `nasser`, `bandung`
pub type Term = String;
