//! Database table operations

mod album_table;
mod song_table;

pub use album_table::AlbumTable;
pub use song_table::SongTable;
