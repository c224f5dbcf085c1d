mod common;

use anyhow::Result;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

use common::{RecordingSleeper, StubSite};
use poem_harvester::gateway::paragraphs::{read_paragraphs, write_paragraphs};
use poem_harvester::gateway::shortlist_file::{read_shortlist, write_shortlist};
use poem_harvester::gateway::{corpus, PageCache};
use poem_harvester::pipeline::bands::load_bands;
use poem_harvester::pipeline::shortlist::{candidate_pool, classify, ShortlistOptions};
use poem_harvester::pipeline::{FetchEngine, FetchPolicy};
use poem_harvester::tools::band_mods::{build_band_files, BandModsOptions};
use poem_harvester::tools::forum_post::format_post;
use poem_harvester::types::BandName;

/// `n` words of five letters: typed chars = 6n - 1.
fn words(n: usize) -> String {
    vec!["verse"; n].join(" ")
}

/// Detail page with a title line, a byline and the body spread over six lines.
fn detail_page(title: &str, author: &str, word_count: usize) -> String {
    let per_line = word_count / 6;
    let lines: Vec<String> = (0..6).map(|_| words(per_line)).collect();
    format!(
        "<html><body><table>\
         <tr><td>Main Menu<br>Home<br>Poets</td></tr>\
         <tr><td>{title}<br>By {author}<br>{}</td></tr>\
         <tr><td>Sponsored Links</td></tr>\
         </table></body></html>",
        lines.join("<br>")
    )
}

#[test]
fn test_classifier_end_to_end() -> Result<()> {
    let dir = tempdir()?;

    // Baseline of 60..=150 words: tertiles split words at 90 and 120.
    let baseline: Vec<String> = (0..=9).map(|i| words(60 + 10 * i)).collect();
    let baseline_path = dir.path().join("mod.paragraphs");
    write_paragraphs(&baseline_path, &baseline)?;
    let bands = load_bands(&baseline_path)?;
    assert_eq!(bands[0].word_range, (60, 90));
    assert_eq!(bands[1].word_range, (91, 120));
    assert_eq!(bands[2].word_range, (121, 170));

    // Corpus: views decide scan order; one row out of the line range, one duplicate link.
    let corpus_path = dir.path().join("poems.csv");
    fs::write(
        &corpus_path,
        "title,link,lines,views,source_page\n\
         Short One,https://poems.test/ann-lee/short-one,12,900,1\n\
         Tiny,https://poems.test/ann-lee/tiny,4,5000,1\n\
         Middle,https://poems.test/bo-ray/middle,20,800,1\n\
         Long Song,https://poems.test/cy-fox/long-song,40,700,2\n\
         Broken,https://poems.test/cy-fox/broken,30,650,2\n\
         Short Two,https://poems.test/ann-lee/short-two,12,600,2\n\
         Short One,https://poems.test/ann-lee/short-one,12,900,3\n",
    )?;
    let records = corpus::load_pool(&corpus_path)?;
    assert_eq!(records.len(), 6);
    let pool = candidate_pool(&records);
    let order: Vec<&str> = pool.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(order, vec!["Short One", "Middle", "Long Song", "Broken", "Short Two"]);

    let site = StubSite::default();
    site.serve("https://poems.test/ann-lee/short-one", detail_page("Short One", "Ann Lee", 72));
    site.serve("https://poems.test/bo-ray/middle", detail_page("Middle", "Bo Ray", 102));
    site.serve("https://poems.test/cy-fox/long-song", detail_page("Long Song", "Cy Fox", 150));
    site.serve("https://poems.test/ann-lee/short-two", detail_page("Short Two", "Ann Lee", 66));
    // "Broken" is never served: every attempt is a 404.
    let sleeper = RecordingSleeper::default();
    let engine = FetchEngine::new(&site, &sleeper, FetchPolicy { max_retries: 2, base_delay: 0.1 }, 42);
    let mut cache = PageCache::new(dir.path().join("cache"), engine);

    let opts = ShortlistOptions { per_band: 1, max_fetch: 100, delay: Duration::from_millis(200) };
    let outcome = classify(&bands, &pool, &mut cache, &sleeper, &opts);

    assert_eq!(outcome.selected[&BandName::Easy][0].title, "Short One");
    assert_eq!(outcome.selected[&BandName::Easy][0].word_count, 72);
    assert_eq!(outcome.selected[&BandName::Medium][0].title, "Middle");
    assert_eq!(outcome.selected[&BandName::Hard][0].title, "Long Song");
    // every band filled before "Broken" and "Short Two" were reached
    assert_eq!(outcome.attempted, 3);
    assert_eq!(site.calls("https://poems.test/cy-fox/broken"), 0);
    assert!(!outcome.selected[&BandName::Easy][0].text.contains("Ann Lee"));

    let shortlist_path = dir.path().join("out/shortlist_candidates.csv");
    write_shortlist(&shortlist_path, &outcome.selected)?;
    let by_band = read_shortlist(&shortlist_path)?;
    assert_eq!(by_band[&BandName::Hard][0].words, "150");

    let post = format_post(&by_band);
    assert!(post.contains("* [url=https://poems.test/bo-ray/middle]Middle by Bo Ray[/url]"));

    // Building the band files reuses the cached pages.
    let calls_before = site.total_calls();
    let band_dir = dir.path().join("band_mods");
    let opts = BandModsOptions { out_dir: band_dir.clone(), target_per_band: 10, extract_attempts: 3 };
    let reports = build_band_files(&by_band, &mut cache, &sleeper, &opts)?;
    assert_eq!(site.total_calls(), calls_before);
    assert!(reports.iter().all(|r| r.written == 1 && r.fallbacks == 0));
    let hard = read_paragraphs(&band_dir.join("mod.paragraphs.hard"))?;
    assert_eq!(hard[0], words(150));
    Ok(())
}

#[test]
fn test_fetch_limit_bounds_the_scan() -> Result<()> {
    let dir = tempdir()?;
    let baseline_path = dir.path().join("mod.paragraphs");
    write_paragraphs(&baseline_path, &(0..=9).map(|i| words(60 + 10 * i)).collect::<Vec<_>>())?;
    let bands = load_bands(&baseline_path)?;

    let corpus_path = dir.path().join("poems.csv");
    let mut csv_text = String::from("title,link,lines,views,source_page\n");
    for i in 0..10 {
        csv_text.push_str(&format!("Missing {i},https://poems.test/x/missing-{i},10,{},1\n", 100 - i));
    }
    fs::write(&corpus_path, csv_text)?;
    let pool = candidate_pool(&corpus::load_pool(&corpus_path)?);

    let site = StubSite::default();
    let sleeper = RecordingSleeper::default();
    let engine = FetchEngine::new(&site, &sleeper, FetchPolicy { max_retries: 1, base_delay: 0.1 }, 42);
    let mut cache = PageCache::new(dir.path().join("cache"), engine);
    let opts = ShortlistOptions { per_band: 5, max_fetch: 4, delay: Duration::ZERO };

    let outcome = classify(&bands, &pool, &mut cache, &sleeper, &opts);
    assert_eq!(outcome.attempted, 4);
    assert_eq!(site.total_calls(), 4);
    assert!(BandName::ALL.iter().all(|b| outcome.count(*b) == 0));
    Ok(())
}
