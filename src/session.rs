use std::io::{BufRead, Write};

use anyhow::Result;

use crate::cache::ResponseCache;
use crate::fetch::Fetcher;
use crate::resolver::Resolver;
use crate::site::SiteRecord;

const STATE_PROMPT: &str = " Enter a state name, e.g. Michigan/michigan/MICHIGAN: ";
const DETAIL_PROMPT: &str = " Enter an index number to view details, or 'back', or 'exit': ";
const INVALID_INPUT: &str = " [Error]: invalid input";
const NO_SITES: &str = " No sites found.";
const FAREWELL: &str = " Thanks for using the service, bye!";
const RULE: &str = " -----------------------------------";

enum Next {
    Back,
    Exit,
}

enum Choice {
    Back,
    Exit,
    Site(usize),
    Invalid,
}

pub async fn run<F, R, W>(
    resolver: &Resolver<'_, F>,
    cache: &mut ResponseCache,
    mut input: R,
    mut output: W,
) -> Result<()>
where
    F: Fetcher + ?Sized,
    R: BufRead,
    W: Write,
{
    let directory = resolver.build_directory(cache).await?;

    while let Some(line) = prompt(&mut input, &mut output, STATE_PROMPT)? {
        let state = line.to_lowercase();
        if state == "exit" {
            break;
        }

        let Some(url) = directory.get(&state) else {
            writeln!(output, "{}", INVALID_INPUT)?;
            continue;
        };

        let sites = resolver.resolve_region(cache, url).await?;
        if sites.is_empty() {
            writeln!(output, "{}", NO_SITES)?;
            continue;
        }

        writeln!(output, "{}", RULE)?;
        writeln!(output, " List of National Sites in {}:", line)?;
        writeln!(output, "{}", RULE)?;
        for (i, site) in sites.iter().enumerate() {
            writeln!(output, " [{}] {}", i + 1, site)?;
        }

        match browse_sites(resolver, cache, &sites, &mut input, &mut output).await? {
            Next::Back => continue,
            Next::Exit => break,
        }
    }

    writeln!(output, "{}", FAREWELL)?;
    output.flush()?;

    Ok(())
}

async fn browse_sites<F, R, W>(
    resolver: &Resolver<'_, F>,
    cache: &mut ResponseCache,
    sites: &[SiteRecord],
    input: &mut R,
    output: &mut W,
) -> Result<Next>
where
    F: Fetcher + ?Sized,
    R: BufRead,
    W: Write,
{
    loop {
        let Some(line) = prompt(input, output, DETAIL_PROMPT)? else {
            return Ok(Next::Exit);
        };

        match parse_choice(&line, sites.len()) {
            Choice::Back => return Ok(Next::Back),
            Choice::Exit => return Ok(Next::Exit),
            Choice::Site(index) => {
                for place in resolver.resolve_nearby(cache, &sites[index]).await? {
                    writeln!(output, " - {}", place)?;
                }
            }
            Choice::Invalid => writeln!(output, "{}", INVALID_INPUT)?,
        }
    }
}

// 1-based on screen, 0-based out
fn parse_choice(line: &str, count: usize) -> Choice {
    match line.to_lowercase().as_str() {
        "back" => Choice::Back,
        "exit" => Choice::Exit,
        other => match other.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => Choice::Site(n - 1),
            _ => Choice::Invalid,
        },
    }
}

/// Prints `text` and reads one trimmed line; `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, text: &str) -> Result<Option<String>> {
    write!(output, "{}", text)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(None);
    }

    Ok(Some(line.trim().to_string()))
}
