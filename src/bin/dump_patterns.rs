use khmer_normalizer::PatternLibrary;

fn escape(body: &str) -> String {
    body.chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_string()
            } else {
                format!("\\u{{{:04X}}}", c as u32)
            }
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let library = PatternLibrary::build()?;
    let wanted: Vec<String> = std::env::args().skip(1).collect();

    println!("Fragments: {}", library.len());
    println!("Expansion rounds: {}", library.rounds());
    for fragment in library.iter() {
        if !wanted.is_empty() && !wanted.contains(&fragment.name) {
            continue;
        }
        println!();
        println!("{} ({} chars)", fragment.name, fragment.body.chars().count());
        println!("  {}", escape(&fragment.body));
    }
    Ok(())
}
