//! CREATE/DROP statement compilation.
//!
//! A builder walks one statement through
//! `{unset} → create|drop → named → [existence-guarded] → built`. The
//! structural keyword (TABLE or TYPE) is fixed by the entry point, which
//! also selects the definition shape `from_schema` emits — so a type
//! builder can never be fed a table definition by accident.

use castellan_schema::SchemaDef;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verb {
    Create,
    Drop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Structure {
    Table,
    Type,
}

impl Structure {
    fn keyword(self) -> &'static str {
        match self {
            Structure::Table => "TABLE",
            Structure::Type => "TYPE",
        }
    }
}

/// Builder for one DDL statement.
#[derive(Clone, Debug)]
pub struct SchemaStatementBuilder {
    verb: Verb,
    structure: Structure,
    verb_clause: String,
    name: String,
    definition: String,
    guarded: bool,
}

impl SchemaStatementBuilder {
    fn new(verb: Verb, structure: Structure) -> Self {
        let keyword = match verb {
            Verb::Create => "CREATE",
            Verb::Drop => "DROP",
        };
        SchemaStatementBuilder {
            verb,
            structure,
            verb_clause: format!("{keyword} {}", structure.keyword()),
            name: String::new(),
            definition: String::new(),
            guarded: false,
        }
    }

    pub fn create_table() -> Self {
        Self::new(Verb::Create, Structure::Table)
    }

    pub fn create_type() -> Self {
        Self::new(Verb::Create, Structure::Type)
    }

    pub fn drop_table() -> Self {
        Self::new(Verb::Drop, Structure::Table)
    }

    pub fn drop_type() -> Self {
        Self::new(Verb::Drop, Structure::Type)
    }

    /// Names the structure being created or dropped.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends `IF NOT EXISTS` to the verb clause. Takes effect only on a
    /// CREATE statement, and only once.
    pub fn if_not_exists(mut self) -> Self {
        if self.verb == Verb::Create && !self.guarded {
            self.guarded = true;
            self.verb_clause.push_str(" IF NOT EXISTS");
        }
        self
    }

    /// Appends `IF EXISTS` to the verb clause. Takes effect only on a
    /// DROP statement, and only once.
    pub fn if_exists(mut self) -> Self {
        if self.verb == Verb::Drop && !self.guarded {
            self.guarded = true;
            self.verb_clause.push_str(" IF EXISTS");
        }
        self
    }

    /// Derives the statement definition from a schema declaration: member
    /// list plus keys and table configuration for a table, member list
    /// alone for a type.
    pub fn from_schema(mut self, def: &SchemaDef) -> Self {
        self.definition = match self.structure {
            Structure::Table => format!(
                "({},{}) {}",
                def.members_definition(),
                def.keys_clause(),
                def.table_config_clause()
            )
            .trim()
            .to_owned(),
            Structure::Type => format!("({})", def.members_definition()),
        };
        self
    }

    /// Assembles the statement text, trimming incidental whitespace.
    pub fn build(&self) -> String {
        format!("{} {}{}", self.verb_clause, self.name, self.definition)
            .trim()
            .to_owned()
    }
}
