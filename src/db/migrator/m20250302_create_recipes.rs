use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Recipes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(RecipeIngredients)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_created_at")
                    .table(RecipesTable::Table)
                    .col(RecipesTable::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // An ingredient name appears at most once per recipe
        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_ingredients_recipe_name")
                    .table(IngredientsTable::Table)
                    .col(IngredientsTable::RecipeId)
                    .col(IngredientsTable::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipeIngredients).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Recipes).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RecipesTable {
    #[sea_orm(iden = "recipes")]
    Table,
    CreatedAt,
}

#[derive(DeriveIden)]
enum IngredientsTable {
    #[sea_orm(iden = "recipe_ingredients")]
    Table,
    RecipeId,
    Name,
}
