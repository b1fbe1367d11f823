// src/registry.rs

//! Static importer registry.
//!
//! Every supported platform has a [`Platform`] entry and an
//! [`ImportCommand`] subcommand carrying its options. Turning a command
//! into a runnable importer is a plain match, no dynamic lookup.

use clap::Subcommand;

use crate::sources::Importer;
use crate::sources::blogger::{BloggerImporter, BloggerOptions};
use crate::sources::csv::{CsvImporter, CsvOptions};
use crate::sources::dotclear::{DotclearImporter, DotclearOptions};
#[cfg(feature = "sqlite")]
use crate::sources::ghost::{GhostImporter, GhostOptions};
use crate::sources::google_reader::{GoogleReaderImporter, GoogleReaderOptions};
use crate::sources::jrnl::{JrnlImporter, JrnlOptions};
use crate::sources::marley::{MarleyImporter, MarleyOptions};
use crate::sources::pebble::{PebbleImporter, PebbleOptions};
use crate::sources::pluxml::{PluxmlImporter, PluxmlOptions};
use crate::sources::rss::{MediumOptions, RssImporter, RssOptions};
use crate::sources::s9y::{S9yImporter, S9yOptions};
use crate::sources::tumblr::{TumblrImporter, TumblrOptions};
use crate::sources::wordpressdotcom::{WordpressDotComImporter, WordpressDotComOptions};

/// Supported blogging platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Csv,
    Jrnl,
    Blogger,
    Rss,
    Medium,
    WordpressDotCom,
    Tumblr,
    #[cfg(feature = "sqlite")]
    Ghost,
    Dotclear,
    Pebble,
    GoogleReader,
    S9y,
    Pluxml,
    Marley,
}

impl Platform {
    /// Every platform compiled into this build.
    pub const ALL: &'static [Platform] = &[
        Platform::Csv,
        Platform::Jrnl,
        Platform::Blogger,
        Platform::Rss,
        Platform::Medium,
        Platform::WordpressDotCom,
        Platform::Tumblr,
        #[cfg(feature = "sqlite")]
        Platform::Ghost,
        Platform::Dotclear,
        Platform::Pebble,
        Platform::GoogleReader,
        Platform::S9y,
        Platform::Pluxml,
        Platform::Marley,
    ];

    /// Subcommand name.
    pub fn name(self) -> &'static str {
        match self {
            Platform::Csv => "csv",
            Platform::Jrnl => "jrnl",
            Platform::Blogger => "blogger",
            Platform::Rss => "rss",
            Platform::Medium => "medium",
            Platform::WordpressDotCom => "wordpressdotcom",
            Platform::Tumblr => "tumblr",
            #[cfg(feature = "sqlite")]
            Platform::Ghost => "ghost",
            Platform::Dotclear => "dotclear",
            Platform::Pebble => "pebble",
            Platform::GoogleReader => "google_reader",
            Platform::S9y => "s9y",
            Platform::Pluxml => "pluxml",
            Platform::Marley => "marley",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Platform::Csv => "CSV file of posts",
            Platform::Jrnl => "jrnl plain-text journal",
            Platform::Blogger => "Blogger Atom export",
            Platform::Rss => "RSS 2.0 feed (file or URL)",
            Platform::Medium => "Medium user feed",
            Platform::WordpressDotCom => "WordPress.com WXR export",
            Platform::Tumblr => "Tumblr blog (v1 API or saved response)",
            #[cfg(feature = "sqlite")]
            Platform::Ghost => "Ghost SQLite database",
            Platform::Dotclear => "Dotclear flat export",
            Platform::Pebble => "Pebble data directory",
            Platform::GoogleReader => "Google Reader Atom export",
            Platform::S9y => "Serendipity RSS feed (URL)",
            Platform::Pluxml => "PluXml article directory",
            Platform::Marley => "Marley data directory",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One subcommand per importer.
#[derive(Subcommand, Debug, Clone)]
pub enum ImportCommand {
    /// Import posts from a CSV file
    Csv(CsvOptions),

    /// Import entries from a jrnl journal
    Jrnl(JrnlOptions),

    /// Import posts from a Blogger Atom export
    Blogger(BloggerOptions),

    /// Import items from an RSS feed
    Rss(RssOptions),

    /// Import posts from a Medium user feed
    Medium(MediumOptions),

    /// Import posts and pages from a WordPress.com export
    #[command(name = "wordpressdotcom")]
    WordpressDotCom(WordpressDotComOptions),

    /// Import posts from a Tumblr blog
    Tumblr(TumblrOptions),

    /// Import posts from a Ghost database
    #[cfg(feature = "sqlite")]
    Ghost(GhostOptions),

    /// Import posts from a Dotclear export
    Dotclear(DotclearOptions),

    /// Import entries from a Pebble data directory
    Pebble(PebbleOptions),

    /// Import items from a Google Reader export
    #[command(name = "google_reader")]
    GoogleReader(GoogleReaderOptions),

    /// Import posts from a Serendipity RSS feed
    S9y(S9yOptions),

    /// Import articles from a PluXml data directory
    Pluxml(PluxmlOptions),

    /// Import articles from a Marley data directory
    Marley(MarleyOptions),
}

impl ImportCommand {
    pub fn platform(&self) -> Platform {
        match self {
            ImportCommand::Csv(_) => Platform::Csv,
            ImportCommand::Jrnl(_) => Platform::Jrnl,
            ImportCommand::Blogger(_) => Platform::Blogger,
            ImportCommand::Rss(_) => Platform::Rss,
            ImportCommand::Medium(_) => Platform::Medium,
            ImportCommand::WordpressDotCom(_) => Platform::WordpressDotCom,
            ImportCommand::Tumblr(_) => Platform::Tumblr,
            #[cfg(feature = "sqlite")]
            ImportCommand::Ghost(_) => Platform::Ghost,
            ImportCommand::Dotclear(_) => Platform::Dotclear,
            ImportCommand::Pebble(_) => Platform::Pebble,
            ImportCommand::GoogleReader(_) => Platform::GoogleReader,
            ImportCommand::S9y(_) => Platform::S9y,
            ImportCommand::Pluxml(_) => Platform::Pluxml,
            ImportCommand::Marley(_) => Platform::Marley,
        }
    }
}

/// Build the importer for a parsed subcommand.
pub fn importer_for(command: ImportCommand) -> Box<dyn Importer> {
    match command {
        ImportCommand::Csv(options) => Box::new(CsvImporter::new(options)),
        ImportCommand::Jrnl(options) => Box::new(JrnlImporter::new(options)),
        ImportCommand::Blogger(options) => Box::new(BloggerImporter::new(options)),
        ImportCommand::Rss(options) => Box::new(RssImporter::new(options)),
        ImportCommand::Medium(options) => Box::new(RssImporter::medium(options)),
        ImportCommand::WordpressDotCom(options) => Box::new(WordpressDotComImporter::new(options)),
        ImportCommand::Tumblr(options) => Box::new(TumblrImporter::new(options)),
        #[cfg(feature = "sqlite")]
        ImportCommand::Ghost(options) => Box::new(GhostImporter::new(options)),
        ImportCommand::Dotclear(options) => Box::new(DotclearImporter::new(options)),
        ImportCommand::Pebble(options) => Box::new(PebbleImporter::new(options)),
        ImportCommand::GoogleReader(options) => Box::new(GoogleReaderImporter::new(options)),
        ImportCommand::S9y(options) => Box::new(S9yImporter::new(options)),
        ImportCommand::Pluxml(options) => Box::new(PluxmlImporter::new(options)),
        ImportCommand::Marley(options) => Box::new(MarleyImporter::new(options)),
    }
}
