use pitchmarket::OutputFile;
use pitchmarket_scrape::scraper::{seeds_or_default, ScrapeOptions, Scraper};
use pitchmarket_scrape::{scraper::HttpOptions, SCRAPER_HEADING};
use std::{env, process, time::Duration};

fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut index = 1;
    let length = args.len();

    let mut http = HttpOptions::default();
    let mut options = ScrapeOptions::default();
    let mut outputs = OutputFile::new();

    while index < length {
        match args[index].as_str() {
            "--output-file" | "-o" => {
                let output_file = args.get(index + 1).expect("No output file specified");
                index += 1;
                outputs.market_output = output_file.clone();
            }
            "--delay" | "-d" => {
                let delay = args
                    .get(index + 1)
                    .expect("No delay specified")
                    .parse()
                    .expect("Delay should be a number of milliseconds");
                index += 1;
                http.politeness_delay = Duration::from_millis(delay);
            }
            "--retries" | "-r" => {
                http.max_retries = args
                    .get(index + 1)
                    .expect("No retry count specified")
                    .parse()
                    .expect("Retry count should be a number");
                index += 1;
            }
            "--page-limit" | "-p" => {
                let limit = args
                    .get(index + 1)
                    .expect("No page limit specified")
                    .parse()
                    .expect("Page limit should be a number");
                index += 1;
                options.page_limit = Some(limit);
            }
            "--league-limit" | "-l" => {
                let limit = args
                    .get(index + 1)
                    .expect("No league limit specified")
                    .parse()
                    .expect("League limit should be a number");
                index += 1;
                options.league_limit = Some(limit);
            }
            "--season" | "-s" => {
                let season = args.get(index + 1).expect("No season specified");
                index += 1;
                options.season = Some(season.clone());
            }
            "--region" => {
                let region = args.get(index + 1).expect("No region specified");
                index += 1;
                options.region = Some(region.clone());
            }
            "--help" | "-h" => {
                eprintln!("Usage: pitchmarket_scrape [args]\n  If an arg is passed multiple times, only the rightmost is considered.\n  Regions to scrape are read from SEED_* environment variables (see .env support);\n  without any, the default European listing is used.\n\n  Output:\n    --output-file  or -o    Where to write the market JSON. Default: ./output/market.json\n\n  Politeness:\n    --delay        or -d    Delay after each successful request, in milliseconds. Default: 2000\n    --retries      or -r    Times to try a url before giving up. Default: 10\n\n  Scope:\n    --page-limit   or -p    Max listing pages per region. Default: all\n    --league-limit or -l    Max leagues per region to descend into. Default: all\n    --season       or -s    Only scrape this season key (e.g. 2024). Default: all offered\n    --region                Only scrape the seed with this id. Default: all seeds\n\n    Display this message instead of running the system.\n    --help         or -h");
                process::exit(1)
            }
            other => {
                eprintln!(
                    "Unknown command line option: {}.\nRun with --help (or -h) for valid commands.",
                    other
                );
                process::exit(1)
            }
        };

        index += 1;
    }

    eprintln!("{}Scraping the market...", SCRAPER_HEADING);
    let scraper = Scraper::new(http, options);

    let result = scraper.scrape(seeds_or_default(), &outputs);

    match result {
        Ok(_) => eprintln!("{}Scrape completed successfully!", SCRAPER_HEADING),
        Err(e) => {
            eprintln!(
                "{}Something went wrong! Specifically, this: {}",
                SCRAPER_HEADING, e
            );
            process::exit(1)
        }
    }
}
