use csv::{Reader, ReaderBuilder};
use std::{fs::File, io, io::Write, path::Path};
use super::error::UploadError;

// open csv for streaming, the header row is read lazily by the caller
pub fn open_csv(path: &Path) -> Result<Reader<File>, UploadError> {
    let file = File::open(path).map_err(|source| UploadError::OpenCsv {
        path: path.to_owned(),
        source,
    })?;
    Ok(csv_from_reader(file))
}

// comma delimited, first line is the header
pub fn csv_from_reader<R: io::Read>(input: R) -> Reader<R> {
    ReaderBuilder::new().has_headers(true).from_reader(input)
}

// read a string
pub fn read_text(prompt_text: &str) -> io::Result<String> {
    print!("{}:", prompt_text);
    io::stdout().flush()?;

    let mut text = String::new();
    io::stdin().read_line(&mut text)?;

    Ok(text.trim().to_owned())
}

// read a string, falling back to default on empty input
pub fn read_text_or(prompt_text: &str, default: &str) -> io::Result<String> {
    let text = read_text(&format!("{} [{}]", prompt_text, default))?;
    Ok(if text.is_empty() { default.to_owned() } else { text })
}

// read a boolean (yes or no)
pub fn read_yes_or_no(prompt_text: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "Y/n" } else { "N/y" };
    let answer = read_text(&format!("{} ({})", prompt_text, hint))?;
    Ok(parse_yes_or_no(&answer, default))
}

fn parse_yes_or_no(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().chars().next() {
        None => default,
        Some(first) => first == 'y',
    }
}
