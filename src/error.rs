use snafu::Snafu;

/// The public Error type for this crate.
#[derive(Debug, Snafu)]
pub struct Error(LibError);

/// The public Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The internal Result type for this crate.
pub(crate) type LibResult<T> = std::result::Result<T, LibError>;

/// The internal Error type for this crate. Covers infrastructure-level failures only —
/// faults in running `mlang` programs are reported as `Value::Error`, not here.
#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub(crate) enum LibError {
    #[snafu(display("{}: error reading {}: {}", site, path, source))]
    Io {
        site: String,
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("{}: error writing MIDI file {}: {}", site, path, source))]
    MidiIo {
        site: String,
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("{}: {}", site, messages.join("\n")))]
    Script { site: String, messages: Vec<String> },
}

macro_rules! site {
    () => {
        format!("{}:{}", file!(), line!())
    };
}

macro_rules! io_err {
    ($path:expr) => {
        crate::error::Io {
            site: site!(),
            path: $path,
        }
    };
}

macro_rules! midi_io_err {
    ($path:expr) => {
        crate::error::MidiIo {
            site: site!(),
            path: $path,
        }
    };
}

macro_rules! script_err {
    ($messages:expr) => {
        crate::error::Script {
            site: site!(),
            messages: $messages,
        }
        .build()
    };
}

#[test]
fn site_test() {
    let line = line!() + 1;
    let site = site!();
    assert!(site.contains("error.rs"));
    assert!(site.contains(format!("{}", line).as_str()));
}

#[test]
fn script_err_message_joins_lines() {
    let err: LibError = script_err!(vec!["line 1, oops".to_string(), "line 2, oops".to_string()]);
    let message = format!("{}", err);
    assert!(message.contains("line 1, oops"));
    assert!(message.contains("line 2, oops"));
}
