pub(super) const SELECT_VERSION: &str = r#"
    SELECT version
    FROM change_list_versions
    WHERE collection = ?1
"#;

pub(super) const UPSERT_VERSION: &str = r#"
    INSERT INTO change_list_versions (collection, version, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(collection) DO UPDATE SET
        version = MAX(version, excluded.version),
        updated_at = excluded.updated_at
"#;

pub(super) const UPSERT_TOPIC: &str = r#"
    INSERT INTO topics (id, name, short_description, long_description, url, image_url)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        short_description = excluded.short_description,
        long_description = excluded.long_description,
        url = excluded.url,
        image_url = excluded.image_url
"#;

pub(super) const INSERT_OR_IGNORE_TOPIC: &str = r#"
    INSERT OR IGNORE INTO topics (id, name, short_description, long_description, url, image_url)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub(super) const DELETE_TOPIC: &str = r#"
    DELETE FROM topics
    WHERE id = ?1
"#;

pub(super) const DELETE_TOPIC_REFS_BY_TOPIC: &str = r#"
    DELETE FROM news_resources_topics
    WHERE topic_id = ?1
"#;

pub(super) const DELETE_FOLLOWED_TOPIC: &str = r#"
    DELETE FROM followed_topics
    WHERE topic_id = ?1
"#;

pub(super) const SELECT_TOPIC_IDS: &str = r#"
    SELECT id
    FROM topics
"#;

pub(super) const SELECT_TOPIC_BY_ID: &str = r#"
    SELECT id, name, short_description, long_description, url, image_url
    FROM topics
    WHERE id = ?1
"#;

pub(super) const UPSERT_NEWS_RESOURCE: &str = r#"
    INSERT INTO news_resources (
        id,
        title,
        content,
        url,
        header_image_url,
        publish_date,
        resource_type
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        content = excluded.content,
        url = excluded.url,
        header_image_url = excluded.header_image_url,
        publish_date = excluded.publish_date,
        resource_type = excluded.resource_type
"#;

pub(super) const DELETE_NEWS_RESOURCE: &str = r#"
    DELETE FROM news_resources
    WHERE id = ?1
"#;

pub(super) const DELETE_TOPIC_REFS_BY_NEWS_RESOURCE: &str = r#"
    DELETE FROM news_resources_topics
    WHERE news_resource_id = ?1
"#;

pub(super) const INSERT_OR_IGNORE_TOPIC_REF: &str = r#"
    INSERT OR IGNORE INTO news_resources_topics (news_resource_id, topic_id)
    VALUES (?1, ?2)
"#;

pub(super) const SELECT_NEWS_RESOURCE_BY_ID: &str = r#"
    SELECT id, title, content, url, header_image_url, publish_date, resource_type
    FROM news_resources
    WHERE id = ?1
"#;

pub(super) const SELECT_TOPIC_IDS_FOR_NEWS_RESOURCE: &str = r#"
    SELECT topic_id
    FROM news_resources_topics
    WHERE news_resource_id = ?1
    ORDER BY topic_id
"#;

pub(super) const SELECT_FOLLOWED_TOPIC_IDS: &str = r#"
    SELECT topic_id
    FROM followed_topics
"#;

pub(super) const INSERT_FOLLOWED_TOPIC: &str = r#"
    INSERT INTO followed_topics (topic_id, followed_at)
    VALUES (?1, ?2)
    ON CONFLICT(topic_id) DO NOTHING
"#;

pub(super) const INSERT_VIEWED_NEWS_RESOURCE: &str = r#"
    INSERT INTO viewed_news_resources (news_resource_id, viewed_at)
    VALUES (?1, ?2)
    ON CONFLICT(news_resource_id) DO NOTHING
"#;

pub(super) const DELETE_VIEWED_NEWS_RESOURCE: &str = r#"
    DELETE FROM viewed_news_resources
    WHERE news_resource_id = ?1
"#;

pub(super) const SELECT_VIEWED_NEWS_RESOURCE: &str = r#"
    SELECT 1
    FROM viewed_news_resources
    WHERE news_resource_id = ?1
"#;
