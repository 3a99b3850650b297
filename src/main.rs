use clap::{arg,crate_version,Command};
use std::io::Cursor;
use huffpack::{huffman,display,FrequencyTable,HuffTree,CodeTable};
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            log::warn!("existing file will be truncated after writing");
            return true;
        }
        return false;
    }
    true
}

/// Print whichever of the frequency table, tree, and code table were requested.
fn print_tables(expanded: &[u8],freq_flag: bool,tree_flag: bool,code_flag: bool) -> STDRESULT {
    let freq = FrequencyTable::build(expanded);
    if freq_flag {
        print!("{}",display::frequency_report(&freq));
    }
    if !tree_flag && !code_flag {
        return Ok(());
    }
    if freq.is_empty() {
        println!("no symbols, no code tree");
        return Ok(());
    }
    let tree = HuffTree::build(&freq)?;
    if tree_flag {
        print!("{}",display::tree_report(&tree));
    }
    if code_flag {
        print!("{}",display::code_report(&CodeTable::from_tree(&tree)));
    }
    Ok(())
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `huffpack my_expanded -c my_compressed -s`
Expand:        `huffpack my_compressed -u my_expanded`
Inspect:       `huffpack my_expanded -f -t -b`";

    let main_cmd = Command::new("huffpack")
        .about("Compress and expand with Huffman codes")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!(<INPUT> "input path"))
        .arg(arg!(-c --compress <PATH> "compress input into this path")
            .conflicts_with("uncompress"))
        .arg(arg!(-u --uncompress <PATH> "expand input into this path"))
        .arg(arg!(-f --freq "print the frequency table"))
        .arg(arg!(-t --tree "print the code tree"))
        .arg(arg!(-b --bits "print the code table"))
        .arg(arg!(-s --stats "print sizes and compression ratio"));

    let matches = main_cmd.get_matches();
    let path_in = matches.get_one::<String>("INPUT").expect(RCH);
    let freq_flag = matches.get_flag("freq");
    let tree_flag = matches.get_flag("tree");
    let code_flag = matches.get_flag("bits");
    let tables = freq_flag || tree_flag || code_flag;

    if let Some(path_out) = matches.get_one::<String>("compress") {
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)?;
        let summary = huffman::compress(&mut in_file,&mut out_file,&huffman::STD_OPTIONS)?;
        out_file.set_len(summary.out_size)?;
        eprintln!("compressed {} into {}",summary.in_size,summary.out_size);
        if tables {
            print_tables(&std::fs::read(path_in)?,freq_flag,tree_flag,code_flag)?;
        }
        if matches.get_flag("stats") {
            print!("{}",display::ratio_report(&summary,true));
        }
    } else if let Some(path_out) = matches.get_one::<String>("uncompress") {
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)?;
        let summary = huffman::expand(&mut in_file,&mut out_file,&huffman::STD_OPTIONS)?;
        out_file.set_len(summary.out_size)?;
        eprintln!("expanded {} into {}",summary.in_size,summary.out_size);
        if tables {
            print_tables(&std::fs::read(path_out)?,freq_flag,tree_flag,code_flag)?;
        }
        if matches.get_flag("stats") {
            print!("{}",display::ratio_report(&summary,false));
        }
    } else {
        // no output requested, report on the input as if compressing it
        let expanded = std::fs::read(path_in)?;
        if tables {
            print_tables(&expanded,freq_flag,tree_flag,code_flag)?;
        }
        if matches.get_flag("stats") {
            let mut src = Cursor::new(&expanded);
            let mut dst: Cursor<Vec<u8>> = Cursor::new(Vec::new());
            let summary = huffman::compress(&mut src,&mut dst,&huffman::STD_OPTIONS)?;
            print!("{}",display::ratio_report(&summary,true));
        }
    }

    Ok(())
}
