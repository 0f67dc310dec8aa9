//! Tantivy-based search index module.
//!
//! Full-text search over extracted interview questions with field boosting.
//! The index is derived from the database and can be rebuilt at any time.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::db::QuestionSearchDoc;
use crate::errors::AppError;

const BOOST_TEXT: f32 = 10.0;
const BOOST_TAGS: f32 = 6.0;
const BOOST_COMPANY: f32 = 4.0;
const BOOST_ROLE: f32 = 4.0;
const BOOST_TITLE: f32 = 2.5;

/// A matching question id and its relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub question_id: String,
    pub score: f32,
}

/// One page of hits plus the total number of matches.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub total: usize,
}

struct SearchFields {
    question_id: Field,
    topic_id: Field,
    text: Field,
    tags: Field,
    company: Field,
    role: Field,
    title: Field,
}

/// Tantivy search index for questions.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let question_id = schema_builder.add_text_field("question_id", STRING | STORED);
        let topic_id = schema_builder.add_text_field("topic_id", STRING);
        let text = schema_builder.add_text_field("text", TEXT);
        let tags = schema_builder.add_text_field("tags", TEXT);
        let company = schema_builder.add_text_field("company", TEXT);
        let role = schema_builder.add_text_field("role", TEXT);
        let title = schema_builder.add_text_field("title", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            question_id,
            topic_id,
            text,
            tags,
            company,
            role,
            title,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Replace the whole index with `docs`.
    pub async fn rebuild(&self, docs: &[QuestionSearchDoc]) -> Result<usize, AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for question in docs {
            writer.add_document(self.create_document(question))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} questions", docs.len());
        Ok(docs.len())
    }

    /// Replace the indexed questions of one post.
    pub async fn index_post(&self, topic_id: i64, docs: &[QuestionSearchDoc]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(
            self.fields.topic_id,
            &topic_id.to_string(),
        ));
        for question in docs {
            writer.add_document(self.create_document(question))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search questions matching the query.
    ///
    /// A blank query matches nothing. A query the parser rejects is a bad request.
    pub fn search(&self, query_str: &str, limit: usize, offset: usize) -> Result<SearchPage, AppError> {
        if query_str.trim().is_empty() {
            return Ok(SearchPage::default());
        }

        let searcher = self.reader.searcher();

        let field_boosts = [
            (self.fields.text, BOOST_TEXT),
            (self.fields.tags, BOOST_TAGS),
            (self.fields.company, BOOST_COMPANY),
            (self.fields.role, BOOST_ROLE),
            (self.fields.title, BOOST_TITLE),
        ];

        // Validate against all fields first so syntax errors surface once
        let query_parser = QueryParser::for_index(
            &self.index,
            field_boosts.iter().map(|(field, _)| *field).collect(),
        );
        let base_query = query_parser
            .parse_query(query_str)
            .map_err(|e| AppError::BadRequest(format!("Invalid search query: {}", e)))?;

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in field_boosts {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        let combined_query: Box<dyn Query> = if subqueries.is_empty() {
            base_query
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let (top_docs, total) = searcher
            .search(
                &combined_query,
                &(TopDocs::with_limit(limit.saturating_add(offset).max(1)), Count),
            )
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let question_id = doc.get_first(self.fields.question_id)?.as_str()?.to_string();
                Some(SearchHit { question_id, score })
            })
            .collect();

        Ok(SearchPage { hits, total })
    }

    fn create_document(&self, question: &QuestionSearchDoc) -> TantivyDocument {
        doc!(
            self.fields.question_id => question.question_id.clone(),
            self.fields.topic_id => question.topic_id.to_string(),
            self.fields.text => question.text.clone(),
            self.fields.tags => question.tags.join(" "),
            self.fields.company => question.company.clone().unwrap_or_default(),
            self.fields.role => question.role.clone().unwrap_or_default(),
            self.fields.title => question.title.clone()
        )
    }
}
