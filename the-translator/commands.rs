use std::{
  fs,
  path::{
    Path,
    PathBuf,
  },
  process::ExitCode,
};

use anyhow::{
  Context,
  Result,
  anyhow,
  bail,
};
use the_segment::{
  UnitRef,
  align,
  navigation::VisibilityFilter,
};
use the_session::{
  Backend,
  SaveStatus,
  Session,
  http::HttpBackend,
  memory::MemoryBackend,
};

use crate::{
  cli::{
    Command,
    Source,
  },
  config::Config,
  display,
};

pub async fn run(command: Command, config: &Config) -> Result<ExitCode> {
  match command {
    Command::Show { source, all, tags } => show(&source, all, tags, config).await?,
    Command::Translate {
      source,
      unit,
      text,
      file_index,
      output,
    } => translate(&source, &unit, text, file_index, output, config).await?,
    Command::Check { source } => {
      if check(&source, config).await? > 0 {
        return Ok(ExitCode::FAILURE);
      }
    },
  }
  Ok(ExitCode::SUCCESS)
}

async fn show(source: &Source, all: bool, tags: bool, config: &Config) -> Result<()> {
  let backend = backend_for(source, config)?;
  let mut session = open(backend.as_ref(), source, config).await?;
  if all {
    session.set_filter(VisibilityFilter::show_all());
  }
  print!("{}", display::document_listing(&session, tags));
  Ok(())
}

async fn translate(
  source: &Source,
  unit_id: &str,
  text: String,
  file_index: usize,
  output: Option<PathBuf>,
  config: &Config,
) -> Result<()> {
  let backend = backend_for(source, config)?;
  let mut session = open(backend.as_ref(), source, config).await?;

  let unit = session
    .document()
    .and_then(|document| document.files.get(file_index))
    .and_then(|file| file.unit_position(unit_id))
    .map(|unit_index| UnitRef::new(file_index, unit_index))
    .ok_or_else(|| anyhow!("no trans-unit '{unit_id}' in file {file_index}"))?;

  session.select(unit)?;
  session.set_buffer_text(text)?;
  if let Some(preview) = session.preview() {
    if preview.reordered {
      eprintln!("warning: tags of '{unit_id}' change order");
    }
    println!("preview: {}", display::labeled(&preview.segment));
  }

  match session.save(backend.as_ref()).await? {
    SaveStatus::Applied => println!("saved {unit_id}"),
    SaveStatus::Failed(err) => bail!("failed to save {unit_id}: {err}"),
    SaveStatus::Superseded => bail!("save of {unit_id} was superseded"),
  }

  let exported = session.export(backend.as_ref()).await?;
  let path = output.unwrap_or_else(|| PathBuf::from(&exported.filename));
  fs::write(&path, &exported.bytes)
    .with_context(|| format!("failed to write {}", path.display()))?;
  println!("wrote {}", path.display());
  Ok(())
}

/// Returns the number of units whose target markers disagree with its tags.
async fn check(source: &Source, config: &Config) -> Result<usize> {
  let backend = backend_for(source, config)?;
  let session = open(backend.as_ref(), source, config).await?;
  let document = session
    .document()
    .ok_or_else(|| anyhow!("no document loaded"))?;

  let mut failures = 0usize;
  for (unit_ref, unit) in document.units() {
    let Some(target) = &unit.target else {
      continue;
    };
    if let Err(err) = align::check_counts(&target.text, &target.tags) {
      failures += 1;
      println!("{unit_ref} {}: {err}", unit.id);
    }
  }

  if failures == 0 {
    println!("all targets match their tags");
  } else {
    println!("{failures} unit(s) with mismatched tags");
  }
  Ok(failures)
}

fn backend_for(source: &Source, config: &Config) -> Result<Box<dyn Backend>> {
  if source.remote {
    let backend = HttpBackend::new(config.backend.url.clone(), config.backend.timeout())?;
    log::info!("using document service at {}", backend.base_url());
    Ok(Box::new(backend))
  } else {
    Ok(Box::new(MemoryBackend::new()))
  }
}

async fn open(backend: &dyn Backend, source: &Source, config: &Config) -> Result<Session> {
  let bytes =
    fs::read(&source.path).with_context(|| format!("failed to read {}", source.path.display()))?;
  let mut session = Session::new(config.session_config());
  session
    .load(backend, &upload_name(&source.path), bytes)
    .await
    .with_context(|| format!("failed to load {}", source.path.display()))?;
  Ok(session)
}

fn upload_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
  use the_segment::{
    Document,
    File,
    Segment,
    Tag,
    TagType,
    TransUnit,
  };

  use super::*;

  fn write_document(dir: &Path, target: &str) -> PathBuf {
    let tags = vec![
      Tag::new(TagType::Bpt, 0).with_id("1"),
      Tag::new(TagType::Ept, 9).with_id("1"),
    ];
    let document = Document {
      version: "1.2".to_string(),
      files:   vec![File {
        original:        "menu.rc".to_string(),
        source_language: "en".to_string(),
        target_language: Some("es".to_string()),
        datatype:        None,
        trans_units:     vec![
          TransUnit::new("m1", Segment::new("⟨bpt⟩File⟨ept⟩", tags.clone()))
            .with_target(Segment::new(target, tags)),
        ],
      }],
    };
    let path = dir.join("menu.json");
    fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();
    path
  }

  fn local(path: PathBuf) -> Source {
    Source {
      path,
      remote: false,
    }
  }

  #[tokio::test]
  async fn translate_writes_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_document(dir.path(), "⟨bpt⟩Arch⟨ept⟩");
    let out = dir.path().join("out.json");

    translate(
      &local(path),
      "m1",
      "⟨bpt⟩Archivo⟨ept⟩".to_string(),
      0,
      Some(out.clone()),
      &Config::default(),
    )
    .await
    .unwrap();

    let exported: Document = serde_json::from_slice(&fs::read(out).unwrap()).unwrap();
    let target = exported.files[0].trans_units[0].target.as_ref().unwrap();
    assert_eq!(target.text, "⟨bpt⟩Archivo⟨ept⟩");
    assert_eq!(target.tags[1].position, 12);
  }

  #[tokio::test]
  async fn translate_refuses_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_document(dir.path(), "⟨bpt⟩Arch⟨ept⟩");
    let result = translate(
      &local(path),
      "m1",
      "Archivo".to_string(),
      0,
      Some(dir.path().join("out.json")),
      &Config::default(),
    )
    .await;
    assert!(result.is_err());
    assert!(!dir.path().join("out.json").exists());

    let path = write_document(dir.path(), "⟨bpt⟩Arch⟨ept⟩");
    assert!(
      translate(&local(path), "m9", String::new(), 0, None, &Config::default())
        .await
        .is_err()
    );
  }

  #[tokio::test]
  async fn check_reports_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_document(dir.path(), "⟨bpt⟩Arch⟨ept⟩");
    assert_eq!(check(&local(path), &Config::default()).await.unwrap(), 0);

    let path = write_document(dir.path(), "Arch⟨ept⟩");
    assert_eq!(check(&local(path), &Config::default()).await.unwrap(), 1);
  }
}
